use std::net::Ipv4Addr;

use subprocess::Exec;

use super::{capture, ovs::SwitchCommand, CommandOutput};

/// Prefix shared by all switch container names.
pub const SWITCH_NAME_PREFIX: &str = "ovs";

/// Parameters of a new switch container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchLaunch {
    pub name: String,
    pub controller: Ipv4Addr,
    pub image: String,
}

impl SwitchLaunch {
    /// Value of the `MODE` variable the image uses to find its controller.
    pub fn mode(&self) -> String {
        format!("tcp:{}", self.controller)
    }
}

/// Everything the harness needs from the container runtime.
pub trait ContainerDriver {
    /// ID of the image switches are started from, if there is one.
    fn find_image(&self) -> anyhow::Result<Option<String>>;

    fn run_switch(&self, launch: &SwitchLaunch) -> anyhow::Result<CommandOutput>;

    fn stop(&self, name: &str) -> anyhow::Result<CommandOutput>;

    fn remove(&self, name: &str) -> anyhow::Result<CommandOutput>;

    fn inspect(&self, name: &str) -> anyhow::Result<CommandOutput>;

    fn exec(&self, name: &str, cmd: &SwitchCommand) -> anyhow::Result<CommandOutput>;

    /// Names of all switch containers, sorted lexically (`ovs10` before `ovs2`).
    fn list_switches(&self) -> anyhow::Result<Vec<String>>;

    fn switch_count(&self) -> anyhow::Result<usize> {
        Ok(self.list_switches()?.len())
    }
}

/// Drives the `docker` command line client.
pub struct DockerCli {
    image_filter: String,
}

impl DockerCli {
    pub fn new(image_filter: impl Into<String>) -> Self {
        DockerCli {
            image_filter: image_filter.into(),
        }
    }

    fn docker(&self) -> Exec {
        Exec::cmd("docker")
    }
}

impl ContainerDriver for DockerCli {
    fn find_image(&self) -> anyhow::Result<Option<String>> {
        let out = capture(self.docker().args(&["images", "-q", &self.image_filter]))?;
        if !out.success {
            warn!("listing docker images failed: {}", out.output.trim());
            return Ok(None);
        }
        Ok(out.output.lines().next().map(|id| id.trim().to_string()).filter(|id| !id.is_empty()))
    }

    fn run_switch(&self, launch: &SwitchLaunch) -> anyhow::Result<CommandOutput> {
        capture(self.docker().args(&[
            "run",
            "--name",
            &launch.name,
            "-e",
            &format!("MODE={}", launch.mode()),
            "-itd",
            "--cap-add",
            "NET_ADMIN",
            &launch.image,
        ]))
    }

    fn stop(&self, name: &str) -> anyhow::Result<CommandOutput> {
        capture(self.docker().args(&["stop", name]))
    }

    fn remove(&self, name: &str) -> anyhow::Result<CommandOutput> {
        capture(self.docker().args(&["rm", "-f", name]))
    }

    fn inspect(&self, name: &str) -> anyhow::Result<CommandOutput> {
        capture(self.docker().args(&["inspect", name]))
    }

    fn exec(&self, name: &str, cmd: &SwitchCommand) -> anyhow::Result<CommandOutput> {
        let argv = cmd.argv();
        capture(self.docker().arg("exec").arg(name).args(argv.as_slice()))
    }

    fn list_switches(&self) -> anyhow::Result<Vec<String>> {
        let out = capture(self.docker().args(&[
            "ps",
            "-a",
            "--filter",
            &format!("name={}", SWITCH_NAME_PREFIX),
            "--format",
            "{{.Names}}",
        ]))?;
        if !out.success {
            anyhow::bail!("docker ps failed: {}", out.output.trim());
        }

        Ok(parse_switch_names(&out.output))
    }
}

/// The name filter of `docker ps` matches substrings, so filter again by prefix.
pub fn parse_switch_names(output: &str) -> Vec<String> {
    let mut names: Vec<String> = output
        .lines()
        .map(str::trim)
        .filter(|n| n.starts_with(SWITCH_NAME_PREFIX))
        .map(String::from)
        .collect();
    names.sort();
    names
}
