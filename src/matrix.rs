//! Decides which single action an invocation performs.
//!
//! The flags are checked as a priority chain: the first primary flag found
//! governs, then only its own companion rules are looked at. Only the first
//! violated rule is reported.

use std::{net::Ipv4Addr, str::FromStr};

use thiserror::Error;

use crate::{
    range::{validate_range, SwitchRange},
    request::{CommandRequest, DumpTarget},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
    #[error("--{0} option can not be given with --start-switches option.")]
    ConflictsWithStart(&'static str),
    #[error("Mandatory to specify --controller-ip with --{0} option.")]
    MissingControllerIp(&'static str),
    #[error(
        "Mandatory to specify --start-switches or --create-network or --create-subnet or \
         --bind-ports or --del-neutron-data or --cleanup option with --controller-ip option."
    )]
    ControllerIpAlone,
    #[error("Wrong value {0} is specified with --dump option.")]
    UnknownDumpTarget(String),
    #[error("--range option must also be specified while providing --{0} option.")]
    MissingRange(&'static str),
    #[error("--range option is not given completely.")]
    RangeIncomplete,
    #[error("--range option is not given correctly.")]
    RangeMalformed,
    #[error(
        "--dump or --ping-all or --create-ping-ips-file option must be specified while \
         providing --range option."
    )]
    RangeWithoutAction,
    #[error("Options not specified properly.")]
    NoAction,
}

/// Controller-side operations that may be combined under `--controller-ip`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerStep {
    CreateNetwork,
    CreateSubnet,
    BindPorts(u8),
    DelNeutronData,
    Cleanup,
}

/// The action governing an invocation, with its validated parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    StartSwitches {
        count: u32,
        controller: Ipv4Addr,
    },
    StopSwitches {
        count: u32,
    },
    Controller {
        controller: Ipv4Addr,
        steps: Vec<ControllerStep>,
    },
    Dump {
        targets: Vec<DumpTarget>,
        range: SwitchRange,
        to_file: bool,
    },
    ShowContainersInfo {
        count: u32,
        to_file: bool,
    },
    ShowContainerCount,
    AddPorts {
        ports: u8,
    },
    DelPorts {
        ports: u8,
    },
    CreatePingIpsFile {
        range: SwitchRange,
    },
    PingAll {
        range: SwitchRange,
        to_file: bool,
    },
}

pub fn resolve(req: &CommandRequest) -> Result<Action, ArgError> {
    if let Some(count) = req.start_switches {
        let controller = check_start_companions(req)?;
        return Ok(Action::StartSwitches { count, controller });
    }

    if let Some(count) = req.stop_switches {
        return Ok(Action::StopSwitches { count });
    }

    if let Some(controller) = req.controller_ip {
        let steps = controller_steps(req);
        if steps.is_empty() {
            return Err(ArgError::ControllerIpAlone);
        }
        return Ok(Action::Controller { controller, steps });
    }

    if let Some(dump) = &req.dump {
        let targets = parse_dump_targets(dump)?;
        let range = required_range(req, "dump")?;
        return Ok(Action::Dump {
            targets,
            range,
            to_file: req.output_file,
        });
    }

    if let Some(count) = req.show_containers_info {
        return Ok(Action::ShowContainersInfo {
            count,
            to_file: req.output_file,
        });
    }

    if req.show_container_count {
        return Ok(Action::ShowContainerCount);
    }

    // with --controller-ip these were already handled above
    if req.cleanup {
        return Err(ArgError::MissingControllerIp("cleanup"));
    }

    if let Some(ports) = req.add_ports {
        return Ok(Action::AddPorts { ports });
    }

    if req.bind_ports.is_some() {
        return Err(ArgError::MissingControllerIp("bind-ports"));
    }

    if let Some(ports) = req.del_ports {
        return Ok(Action::DelPorts { ports });
    }

    if req.create_ping_ips_file {
        let range = required_range(req, "create-ping-ips-file")?;
        return Ok(Action::CreatePingIpsFile { range });
    }

    if req.ping_all {
        let range = required_range(req, "ping-all")?;
        return Ok(Action::PingAll {
            range,
            to_file: req.output_file,
        });
    }

    if req.create_network {
        return Err(ArgError::MissingControllerIp("create-network"));
    }
    if req.create_subnet {
        return Err(ArgError::MissingControllerIp("create-subnet"));
    }
    if req.del_neutron_data {
        return Err(ArgError::MissingControllerIp("del-neutron-data"));
    }

    if req.range.is_some() {
        return Err(ArgError::RangeWithoutAction);
    }

    Err(ArgError::NoAction)
}

impl Action {
    /// Flags this action reads from the request.
    fn flags(&self) -> &'static [&'static str] {
        match self {
            Action::StartSwitches { .. } => &["start-switches", "controller-ip"],
            Action::StopSwitches { .. } => &["stop-switches"],
            Action::Controller { .. } => &[
                "controller-ip",
                "create-network",
                "create-subnet",
                "bind-ports",
                "del-neutron-data",
                "cleanup",
            ],
            Action::Dump { .. } => &["dump", "range", "output-file"],
            Action::ShowContainersInfo { .. } => &["show-containers-info", "output-file"],
            Action::ShowContainerCount => &["show-container-count"],
            Action::AddPorts { .. } => &["add-ports"],
            Action::DelPorts { .. } => &["del-ports"],
            Action::CreatePingIpsFile { .. } => &["create-ping-ips-file", "range"],
            Action::PingAll { .. } => &["ping-all", "range", "output-file"],
        }
    }
}

fn given_flags(req: &CommandRequest) -> Vec<&'static str> {
    [
        ("start-switches", req.start_switches.is_some()),
        ("stop-switches", req.stop_switches.is_some()),
        ("controller-ip", req.controller_ip.is_some()),
        ("dump", req.dump.is_some()),
        ("range", req.range.is_some()),
        ("output-file", req.output_file),
        ("show-containers-info", req.show_containers_info.is_some()),
        ("show-container-count", req.show_container_count),
        ("create-network", req.create_network),
        ("create-subnet", req.create_subnet),
        ("del-neutron-data", req.del_neutron_data),
        ("add-ports", req.add_ports.is_some()),
        ("bind-ports", req.bind_ports.is_some()),
        ("del-ports", req.del_ports.is_some()),
        ("create-ping-ips-file", req.create_ping_ips_file),
        ("ping-all", req.ping_all),
        ("cleanup", req.cleanup),
    ]
    .into_iter()
    .filter(|(_, given)| *given)
    .map(|(flag, _)| flag)
    .collect()
}

/// Flags given alongside the resolved action that it does not act on.
pub fn ignored_flags(req: &CommandRequest, action: &Action) -> Vec<&'static str> {
    let used = action.flags();
    given_flags(req)
        .into_iter()
        .filter(|flag| !used.contains(flag))
        .collect()
}

fn check_start_companions(req: &CommandRequest) -> Result<Ipv4Addr, ArgError> {
    if req.stop_switches.is_some() {
        return Err(ArgError::ConflictsWithStart("stop-switches"));
    }
    let controller = req
        .controller_ip
        .ok_or(ArgError::MissingControllerIp("start-switches"))?;

    let forbidden = [
        ("dump", req.dump.is_some()),
        ("range", req.range.is_some()),
        ("show-containers-info", req.show_containers_info.is_some()),
        ("show-container-count", req.show_container_count),
        ("cleanup", req.cleanup),
        ("create-network", req.create_network),
        ("create-subnet", req.create_subnet),
        ("add-ports", req.add_ports.is_some()),
        ("bind-ports", req.bind_ports.is_some()),
        ("del-ports", req.del_ports.is_some()),
        ("del-neutron-data", req.del_neutron_data),
        ("create-ping-ips-file", req.create_ping_ips_file),
        ("ping-all", req.ping_all),
    ];
    match forbidden.into_iter().find(|(_, given)| *given) {
        Some((flag, _)) => Err(ArgError::ConflictsWithStart(flag)),
        None => Ok(controller),
    }
}

fn controller_steps(req: &CommandRequest) -> Vec<ControllerStep> {
    let mut steps = Vec::new();
    if req.create_network {
        steps.push(ControllerStep::CreateNetwork);
    }
    if req.create_subnet {
        steps.push(ControllerStep::CreateSubnet);
    }
    if let Some(ports) = req.bind_ports {
        steps.push(ControllerStep::BindPorts(ports));
    }
    if req.del_neutron_data {
        steps.push(ControllerStep::DelNeutronData);
    }
    if req.cleanup {
        steps.push(ControllerStep::Cleanup);
    }
    steps
}

fn parse_dump_targets(raw: &[String]) -> Result<Vec<DumpTarget>, ArgError> {
    let mut targets = Vec::with_capacity(raw.len());
    let mut all = false;
    for elem in raw {
        if elem == "all" {
            all = true;
            continue;
        }
        let target =
            DumpTarget::from_str(elem).map_err(|_| ArgError::UnknownDumpTarget(elem.clone()))?;
        targets.push(target);
    }

    if all {
        Ok(DumpTarget::ALL.to_vec())
    } else {
        Ok(targets)
    }
}

fn required_range(req: &CommandRequest, option: &'static str) -> Result<SwitchRange, ArgError> {
    let raw = req.range.as_ref().ok_or(ArgError::MissingRange(option))?;
    validate_range(raw)
}
