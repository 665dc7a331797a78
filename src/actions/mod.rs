use crate::{
    config::HarnessConfig,
    matrix::{Action, ControllerStep},
    utils::{
        controller::{ControllerClient, CurlController},
        docker::ContainerDriver,
        ovs::SwitchCommand,
    },
};

pub mod cleanup;
pub mod dump;
pub mod neutron;
pub mod ping;
pub mod ports;
pub mod switches;

/// A unit of a batch that did not go through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFailure {
    pub unit: String,
    pub reason: String,
}

/// Outcome of a batch: one entry per unit, failures don't stop the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failures: Vec<UnitFailure>,
}

impl BatchReport {
    pub fn record(&mut self, unit: impl Into<String>, result: Result<(), String>) {
        match result {
            Ok(()) => self.succeeded += 1,
            Err(reason) => self.failures.push(UnitFailure {
                unit: unit.into(),
                reason,
            }),
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn merge(&mut self, other: BatchReport) {
        self.succeeded += other.succeeded;
        self.failures.extend(other.failures);
    }

    pub fn log_summary(&self) {
        if self.failures.is_empty() {
            info!("{} operations succeeded", self.succeeded);
            return;
        }

        warn!(
            "{} operations succeeded, {} failed",
            self.succeeded,
            self.failed()
        );
        for f in &self.failures {
            warn!("  {}: {}", f.unit, f.reason);
        }
    }
}

/// Run the action against the real docker and controller.
pub fn perform(
    action: Action,
    fleet: &dyn ContainerDriver,
    cfg: &HarnessConfig,
) -> anyhow::Result<BatchReport> {
    match action {
        Action::StartSwitches { count, controller } => {
            switches::start(fleet, cfg, count, controller)
        }
        Action::StopSwitches { count } => switches::stop(fleet, cfg, count),
        Action::Controller { controller, steps } => {
            let client =
                CurlController::new(controller, cfg.controller_port, cfg.controller_auth.clone());
            run_controller_steps(fleet, &client, cfg, &steps)
        }
        Action::Dump {
            targets,
            range,
            to_file,
        } => dump::run(fleet, cfg, &targets, range, to_file),
        Action::ShowContainersInfo { count, to_file } => {
            switches::show_info(fleet, cfg, count, to_file)
        }
        Action::ShowContainerCount => {
            println!("{}", fleet.switch_count()?);
            Ok(BatchReport::default())
        }
        Action::AddPorts { ports } => ports::add(fleet, cfg, ports),
        Action::DelPorts { ports } => ports::delete(fleet, cfg, ports),
        Action::CreatePingIpsFile { range } => ping::create_ping_ips_file(fleet, cfg, range),
        Action::PingAll { range, to_file } => ping::ping_all(fleet, cfg, range, to_file),
    }
}

/// The steps requested together with `--controller-ip`, in order.
pub fn run_controller_steps(
    fleet: &dyn ContainerDriver,
    controller: &dyn ControllerClient,
    cfg: &HarnessConfig,
    steps: &[ControllerStep],
) -> anyhow::Result<BatchReport> {
    let mut report = BatchReport::default();
    for step in steps {
        let r = match *step {
            ControllerStep::CreateNetwork => neutron::create_network(controller, cfg)?,
            ControllerStep::CreateSubnet => neutron::create_subnet(controller, cfg)?,
            ControllerStep::BindPorts(ports) => ports::bind(fleet, controller, cfg, ports)?,
            ControllerStep::DelNeutronData => neutron::del_neutron_data(controller)?,
            ControllerStep::Cleanup => cleanup::run(fleet, controller, cfg)?,
        };
        report.merge(r);
    }
    Ok(report)
}

/// Switch numbers `1..=count` of the running fleet.
fn running_switches(fleet: &dyn ContainerDriver) -> anyhow::Result<Vec<u8>> {
    let count = fleet.switch_count()?;
    if count > u8::MAX as usize {
        warn!(
            "{} switches running, only the first {} get ports",
            count,
            u8::MAX
        );
    }
    Ok((1..=count.min(u8::MAX as usize)).map(|i| i as u8).collect())
}

/// Run one command in a container, non-zero exit is an error.
fn exec_checked(
    fleet: &dyn ContainerDriver,
    container: &str,
    cmd: &SwitchCommand,
) -> Result<String, String> {
    fleet
        .exec(container, cmd)
        .map_err(|e| format!("{:#}", e))
        .and_then(|out| out.check(&cmd.describe()))
}

/// Run every command even if some fail and report the first failure.
fn exec_all(
    fleet: &dyn ContainerDriver,
    container: &str,
    cmds: &[SwitchCommand],
) -> Result<(), String> {
    let mut first_err = None;
    for cmd in cmds {
        if let Err(e) = exec_checked(fleet, container, cmd) {
            debug!("{}: {}", container, e);
            first_err.get_or_insert(e);
        }
    }
    match first_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
