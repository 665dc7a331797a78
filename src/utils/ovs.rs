use std::net::Ipv4Addr;

use anyhow::Context;

use crate::{ident::is_port_address, request::DumpTarget};

use super::CommandOutput;

/// A command executed inside a switch container.
///
/// Covers the OVS management plane (`ovs-vsctl`, `ovs-ofctl`) and the
/// bits of `ip` / `ping` needed to emulate guest ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchCommand {
    /// `ovs-vsctl show`, also used as the readiness probe
    Show,
    AddVethPair { vm_port: String, tap_port: String },
    AddAddress { dev: String, cidr: String },
    LinkUp { dev: String },
    DeleteLink { dev: String },
    AddPort { bridge: String, port: String, iface_id: String },
    DelPort { bridge: String, port: String },
    /// IPv4 addresses of all interfaces, one per line
    ListAddresses,
    LinkInfo { dev: String },
    Ping { src: Ipv4Addr, dst: Ipv4Addr },
    Dump { bridge: String, target: DumpTarget },
    ClearLocalIp,
    DelController { bridge: String },
    DelManager,
}

impl SwitchCommand {
    pub fn argv(&self) -> Vec<String> {
        match self {
            SwitchCommand::Show => strings(&["ovs-vsctl", "show"]),
            SwitchCommand::AddVethPair { vm_port, tap_port } => strings(&[
                "ip",
                "link",
                "add",
                vm_port.as_str(),
                "type",
                "veth",
                "peer",
                "name",
                tap_port.as_str(),
            ]),
            SwitchCommand::AddAddress { dev, cidr } => {
                strings(&["ip", "addr", "add", cidr.as_str(), "dev", dev.as_str()])
            }
            SwitchCommand::LinkUp { dev } => strings(&["ip", "link", "set", "dev", dev.as_str(), "up"]),
            SwitchCommand::DeleteLink { dev } => strings(&["ip", "link", "delete", dev.as_str()]),
            SwitchCommand::AddPort {
                bridge,
                port,
                iface_id,
            } => {
                let external_id = format!("external_ids:iface-id={}", iface_id);
                strings(&[
                    "ovs-vsctl",
                    "add-port",
                    bridge.as_str(),
                    port.as_str(),
                    "--",
                    "set",
                    "Interface",
                    port.as_str(),
                    external_id.as_str(),
                ])
            }
            SwitchCommand::DelPort { bridge, port } => {
                strings(&["ovs-vsctl", "del-port", bridge.as_str(), port.as_str()])
            }
            SwitchCommand::ListAddresses => strings(&["ip", "-4", "-o", "addr", "show"]),
            SwitchCommand::LinkInfo { dev } => {
                strings(&["ip", "-o", "link", "show", "dev", dev.as_str()])
            }
            SwitchCommand::Ping { src, dst } => {
                let (src, dst) = (src.to_string(), dst.to_string());
                strings(&["ping", "-c", "2", "-I", src.as_str(), dst.as_str()])
            }
            SwitchCommand::Dump { bridge, target } => match target {
                DumpTarget::OvsShow => strings(&["ovs-vsctl", "show"]),
                // flow-count is computed from the flow dump
                DumpTarget::FlowCount => {
                    strings(&["ovs-ofctl", "dump-flows", "-O", "Openflow13", bridge.as_str()])
                }
                other => {
                    let verb = format!("dump-{}", other.as_str());
                    strings(&["ovs-ofctl", verb.as_str(), "-O", "Openflow13", bridge.as_str()])
                }
            },
            SwitchCommand::ClearLocalIp => strings(&[
                "ovs-vsctl",
                "remove",
                "Open_vSwitch",
                ".",
                "other_config",
                "local_ip",
            ]),
            SwitchCommand::DelController { bridge } => {
                strings(&["ovs-vsctl", "del-controller", bridge.as_str()])
            }
            SwitchCommand::DelManager => strings(&["ovs-vsctl", "del-manager"]),
        }
    }

    pub fn describe(&self) -> String {
        self.argv().join(" ")
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Extracts the harness-owned (20.0.0.0/16) addresses from `ip -4 -o addr show`.
///
/// example line:
/// >  7: vm-port0101    inet 20.0.1.1/16 scope global vm-port0101\       valid_lft forever
pub fn parse_port_addresses(output: &str) -> Vec<Ipv4Addr> {
    let mut res = Vec::new();
    for line in output.lines() {
        let mut tokens = line.split_whitespace();
        if tokens.by_ref().find(|t| *t == "inet").is_none() {
            continue;
        }
        let addr = tokens
            .next()
            .and_then(|cidr| cidr.split('/').next())
            .and_then(|a| a.parse::<Ipv4Addr>().ok());
        if let Some(addr) = addr {
            if is_port_address(&addr) {
                res.push(addr);
            }
        }
    }
    res
}

/// Extracts the MAC address from `ip -o link show dev X`.
pub fn parse_mac(output: &str) -> anyhow::Result<String> {
    let mut tokens = output.split_whitespace();
    tokens
        .find(|t| *t == "link/ether")
        .context("no link/ether in ip link output")?;
    let mac = tokens.next().context("link/ether without address")?;
    Ok(mac.to_string())
}

/// Number of flow entries in `ovs-ofctl dump-flows` output.
pub fn count_flows(output: &str) -> usize {
    output.lines().filter(|l| l.contains("cookie")).count()
}

/// A ping is good when it exited cleanly and lost nothing.
pub fn ping_passed(out: &CommandOutput) -> bool {
    out.success && out.output.contains(" 0% packet loss")
}
