use crate::{
    config::HarnessConfig,
    ident::{container_name, PortIdentity},
    utils::{
        controller::ControllerClient,
        docker::ContainerDriver,
        neutron::{PortBinding, Templates},
        ovs::{parse_mac, SwitchCommand},
    },
};

use super::{exec_all, exec_checked, running_switches, BatchReport};

/// Give every running switch `ports` emulated VM ports.
pub fn add(
    fleet: &dyn ContainerDriver,
    cfg: &HarnessConfig,
    ports: u8,
) -> anyhow::Result<BatchReport> {
    let mut report = BatchReport::default();

    for switch in running_switches(fleet)? {
        let mut created = 0;
        for port in 1..=ports {
            let id = PortIdentity::derive(switch, port);
            let res = exec_all(fleet, &id.container, &add_port_commands(&id, &cfg.bridge));
            match &res {
                Ok(()) => {
                    created += 1;
                    info!("Created tap port {} on {} switch.", id.tap_port, id.container);
                }
                Err(e) => error!(
                    "failed to create tap port {} on {}: {}",
                    id.tap_port, id.container, e
                ),
            }
            report.record(format!("{}/{}", id.container, id.tap_port), res);
        }
        info!(
            "Created total {} tap ports on {} switch.",
            created,
            container_name(switch as u32)
        );
    }

    Ok(report)
}

/// veth pair, guest side addressed and up, switch side on the bridge and up.
fn add_port_commands(id: &PortIdentity, bridge: &str) -> Vec<SwitchCommand> {
    vec![
        SwitchCommand::AddVethPair {
            vm_port: id.vm_port.clone(),
            tap_port: id.tap_port.clone(),
        },
        SwitchCommand::AddAddress {
            dev: id.vm_port.clone(),
            cidr: id.cidr(),
        },
        SwitchCommand::LinkUp {
            dev: id.vm_port.clone(),
        },
        SwitchCommand::AddPort {
            bridge: bridge.to_string(),
            port: id.tap_port.clone(),
            iface_id: id.iface_id.clone(),
        },
        SwitchCommand::LinkUp {
            dev: id.tap_port.clone(),
        },
    ]
}

/// Create a neutron port for each of the first `ports` ports of every switch.
pub fn bind(
    fleet: &dyn ContainerDriver,
    controller: &dyn ControllerClient,
    cfg: &HarnessConfig,
    ports: u8,
) -> anyhow::Result<BatchReport> {
    let templates = Templates::new(&cfg.work_dir);
    let network_id = templates.network_id()?;
    let subnet_id = templates.subnet_id()?;
    let port_template = templates.port()?;

    let mut report = BatchReport::default();
    for switch in running_switches(fleet)? {
        let mut bound = 0;
        for port in 1..=ports {
            let id = PortIdentity::derive(switch, port);

            let res = exec_checked(
                fleet,
                &id.container,
                &SwitchCommand::LinkInfo {
                    dev: id.vm_port.clone(),
                },
            )
            .and_then(|out| parse_mac(&out).map_err(|e| format!("{:#}", e)))
            .and_then(|mac| {
                let binding = PortBinding::new(&id, mac, &network_id, &subnet_id);
                let body = match &port_template {
                    Some(template) => binding.apply(template),
                    None => binding.default_body(),
                };
                controller
                    .create_port(&body)
                    .map_err(|e| format!("{:#}", e))?
                    .check("create neutron port")
                    .map(|_| ())
            });

            match &res {
                Ok(()) => {
                    bound += 1;
                    info!(
                        "Created neutron port {} and bound to {} on {} switch.",
                        id.iface_id, id.tap_port, id.container
                    );
                }
                Err(e) => error!(
                    "failed to bind {} on {}: {}",
                    id.tap_port, id.container, e
                ),
            }
            report.record(format!("{}/{}", id.container, id.tap_port), res);
        }
        info!(
            "Created total {} neutron ports on {} switch.",
            bound,
            container_name(switch as u32)
        );
    }

    Ok(report)
}

/// Remove the first `ports` ports from every running switch.
pub fn delete(
    fleet: &dyn ContainerDriver,
    cfg: &HarnessConfig,
    ports: u8,
) -> anyhow::Result<BatchReport> {
    let mut report = BatchReport::default();

    for switch in running_switches(fleet)? {
        let mut deleted = 0;
        for port in 1..=ports {
            let id = PortIdentity::derive(switch, port);
            let cmds = [
                SwitchCommand::DelPort {
                    bridge: cfg.bridge.clone(),
                    port: id.tap_port.clone(),
                },
                SwitchCommand::DeleteLink {
                    dev: id.vm_port.clone(),
                },
            ];
            let res = exec_all(fleet, &id.container, &cmds);
            match &res {
                Ok(()) => {
                    deleted += 1;
                    info!(
                        "Deleted {} and {} from {} switch.",
                        id.tap_port, id.vm_port, id.container
                    );
                }
                Err(e) => warn!(
                    "failed to delete {} from {}: {}",
                    id.tap_port, id.container, e
                ),
            }
            report.record(format!("{}/{}", id.container, id.tap_port), res);
        }
        info!(
            "Deleted total {} ports on {} switch.",
            deleted,
            container_name(switch as u32)
        );
    }

    Ok(report)
}
