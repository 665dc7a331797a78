use std::path::{Path, PathBuf};

use subprocess::{Exec, Redirection};

pub mod controller;
pub mod docker;
pub mod neutron;
pub mod ovs;
pub mod sink;

#[cfg(test)]
pub mod fake;

/// Path of a timestamped output file, e.g. `/tmp/dump-flows-outfile-2024-01-31-12-00-00.txt`
pub fn outfile_path(dir: &Path, kind: &str) -> PathBuf {
    dir.join(format!(
        "{}-outfile-{}.txt",
        kind,
        chrono::Local::now().format("%Y-%m-%d-%H-%M-%S")
    ))
}

/// What an external command left behind: exit status and stdout+stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub output: String,
}

impl CommandOutput {
    pub fn ok(output: impl Into<String>) -> Self {
        CommandOutput {
            success: true,
            output: output.into(),
        }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        CommandOutput {
            success: false,
            output: output.into(),
        }
    }

    /// Turn a non-zero exit into an error message naming `what` failed.
    pub fn check(self, what: &str) -> Result<String, String> {
        if self.success {
            Ok(self.output)
        } else {
            Err(format!("{} failed: {}", what, self.output.trim()))
        }
    }
}

/// Run the command to completion, capturing stdout and stderr together.
pub fn capture(exec: Exec) -> anyhow::Result<CommandOutput> {
    debug!("running {}", exec.to_cmdline_lossy());
    let data = exec
        .stdout(Redirection::Pipe)
        .stderr(Redirection::Merge)
        .capture()?;

    Ok(CommandOutput {
        success: data.success(),
        output: data.stdout_str(),
    })
}
