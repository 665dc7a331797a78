//! In-memory stand-ins for docker and the controller.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    fs,
    net::Ipv4Addr,
    path::Path,
    rc::Rc,
};

use log::Level;
use serde_json::{json, Value};

use crate::{config::HarnessConfig, ident::is_port_address, request::DumpTarget};

use super::{
    controller::ControllerClient,
    docker::{ContainerDriver, SwitchLaunch},
    neutron::{NETWORK_TEMPLATE, SUBNET_TEMPLATE},
    ovs::SwitchCommand,
    CommandOutput,
};

type Journal = Rc<RefCell<Vec<String>>>;

pub fn test_config(dir: &Path) -> HarnessConfig {
    HarnessConfig {
        work_dir: dir.to_path_buf(),
        image_filter: "*dockernet*".into(),
        bridge: "br-int".into(),
        controller_port: 8181,
        controller_auth: "admin:admin".into(),
        settle_ms: 0,
        ready_timeout_secs: 1,
        log_level: Level::Info,
    }
}

pub fn write_templates(dir: &Path) {
    fs::write(
        dir.join(NETWORK_TEMPLATE),
        r#"{"network": {"id": "net-0001", "name": "net1", "admin_state_up": true}}"#,
    )
    .unwrap();
    fs::write(
        dir.join(SUBNET_TEMPLATE),
        r#"{"subnet": {"id": "subnet-0001", "network_id": "net-0001", "cidr": "20.0.0.0/16"}}"#,
    )
    .unwrap();
}

#[derive(Debug, Clone)]
struct Link {
    name: String,
    peer: String,
    mac: String,
    addr: Option<Ipv4Addr>,
}

#[derive(Debug, Default)]
struct Switch {
    links: Vec<Link>,
    bridge_ports: Vec<String>,
}

impl Switch {
    fn link(&self, dev: &str) -> Option<&Link> {
        self.links.iter().find(|l| l.name == dev)
    }

    fn has_addr(&self, addr: Ipv4Addr) -> bool {
        self.links.iter().any(|l| l.addr == Some(addr))
    }
}

fn no_device(dev: &str) -> CommandOutput {
    CommandOutput::failed(format!("Cannot find device \"{}\"", dev))
}

const FLOWS: &str = "\
OFPST_FLOW reply (OF1.3) (xid=0x2):
 cookie=0x8000000, duration=5.1s, table=0, n_packets=0, priority=4,in_port=1 actions=goto_table:17
 cookie=0x0, duration=5.1s, table=17, n_packets=0, priority=0 actions=drop
";

/// A docker host that keeps switches, links and bridge ports in memory.
///
/// Every state-changing call is written to the journal so tests can check
/// ordering.
pub struct FakeFleet {
    image: Option<String>,
    switches: RefCell<BTreeMap<String, Switch>>,
    journal: Journal,
    next_mac: Cell<u32>,
}

impl FakeFleet {
    pub fn with_switches(names: &[&str]) -> FakeFleet {
        FakeFleet {
            image: Some("3f1c2d9a0b7e".into()),
            switches: RefCell::new(
                names
                    .iter()
                    .map(|n| (n.to_string(), Switch::default()))
                    .collect(),
            ),
            journal: Journal::default(),
            next_mac: Cell::new(1),
        }
    }

    pub fn without_image() -> FakeFleet {
        FakeFleet {
            image: None,
            ..FakeFleet::with_switches(&[])
        }
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.borrow().clone()
    }

    pub fn clear_journal(&self) {
        self.journal.borrow_mut().clear();
    }

    fn log(&self, entry: String) {
        self.journal.borrow_mut().push(entry);
    }

    /// Port addresses of a switch in the order they were configured.
    pub fn port_addresses(&self, name: &str) -> Vec<Ipv4Addr> {
        self.switches
            .borrow()
            .get(name)
            .map(|s| {
                s.links
                    .iter()
                    .filter_map(|l| l.addr)
                    .filter(is_port_address)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn mac_of(&self, name: &str, dev: &str) -> Option<String> {
        self.switches
            .borrow()
            .get(name)
            .and_then(|s| s.link(dev))
            .map(|l| l.mac.clone())
    }

    fn mac(&self) -> String {
        let n = self.next_mac.get();
        self.next_mac.set(n + 1);
        format!("02:42:ac:11:{:02x}:{:02x}", (n >> 8) & 0xff, n & 0xff)
    }

    fn run_in(
        &self,
        switches: &mut BTreeMap<String, Switch>,
        name: &str,
        cmd: &SwitchCommand,
    ) -> CommandOutput {
        // any configured port address answers, wherever it lives
        if let SwitchCommand::Ping { src, dst } = *cmd {
            let local = switches.get(name).map_or(false, |s| s.has_addr(src));
            let reachable = switches.values().any(|s| s.has_addr(dst));
            return if local && reachable {
                CommandOutput::ok(format!(
                    "PING {} from {}\n2 packets transmitted, 2 received, 0% packet loss, time 1001ms\n",
                    dst, src
                ))
            } else {
                CommandOutput::failed(format!(
                    "PING {} from {}\n2 packets transmitted, 0 received, 100% packet loss, time 1001ms\n",
                    dst, src
                ))
            };
        }

        let switch = match switches.get_mut(name) {
            Some(s) => s,
            None => return CommandOutput::failed(format!("Error: No such container: {}", name)),
        };

        match cmd {
            SwitchCommand::Show => CommandOutput::ok("    Bridge br-int\n        fail_mode: secure\n"),
            SwitchCommand::AddVethPair { vm_port, tap_port } => {
                if switch.link(vm_port).is_some() || switch.link(tap_port).is_some() {
                    return CommandOutput::failed("RTNETLINK answers: File exists");
                }
                let (vm_mac, tap_mac) = (self.mac(), self.mac());
                switch.links.push(Link {
                    name: vm_port.clone(),
                    peer: tap_port.clone(),
                    mac: vm_mac,
                    addr: None,
                });
                switch.links.push(Link {
                    name: tap_port.clone(),
                    peer: vm_port.clone(),
                    mac: tap_mac,
                    addr: None,
                });
                CommandOutput::ok("")
            }
            SwitchCommand::AddAddress { dev, cidr } => {
                let addr: Ipv4Addr = match cidr.split('/').next().and_then(|a| a.parse().ok()) {
                    Some(a) => a,
                    None => return CommandOutput::failed(format!("Error: invalid address \"{}\"", cidr)),
                };
                match switch.links.iter_mut().find(|l| &l.name == dev) {
                    None => no_device(dev),
                    Some(l) if l.addr.is_some() => CommandOutput::failed("RTNETLINK answers: File exists"),
                    Some(l) => {
                        l.addr = Some(addr);
                        CommandOutput::ok("")
                    }
                }
            }
            SwitchCommand::LinkUp { dev } => match switch.link(dev) {
                Some(_) => CommandOutput::ok(""),
                None => no_device(dev),
            },
            SwitchCommand::DeleteLink { dev } => {
                let peer = match switch.link(dev) {
                    Some(l) => l.peer.clone(),
                    None => return no_device(dev),
                };
                switch.links.retain(|l| &l.name != dev && l.name != peer);
                CommandOutput::ok("")
            }
            SwitchCommand::AddPort { port, .. } => {
                if switch.bridge_ports.contains(port) {
                    return CommandOutput::failed(format!(
                        "ovs-vsctl: cannot create a port named {} because a port named {} already exists on bridge br-int",
                        port, port
                    ));
                }
                switch.bridge_ports.push(port.clone());
                CommandOutput::ok("")
            }
            SwitchCommand::DelPort { bridge, port } => {
                if !switch.bridge_ports.contains(port) {
                    return CommandOutput::failed(format!(
                        "ovs-vsctl: bridge {} does not have a port {}",
                        bridge, port
                    ));
                }
                switch.bridge_ports.retain(|p| p != port);
                CommandOutput::ok("")
            }
            SwitchCommand::ListAddresses => {
                let mut out = String::from(
                    "1: lo    inet 127.0.0.1/8 scope host lo\\       valid_lft forever preferred_lft forever\n\
                     42: eth0    inet 172.17.0.2/16 brd 172.17.255.255 scope global eth0\\       valid_lft forever preferred_lft forever\n",
                );
                for (i, l) in switch.links.iter().enumerate() {
                    if let Some(addr) = l.addr {
                        out.push_str(&format!(
                            "{}: {}    inet {}/16 scope global {}\\       valid_lft forever preferred_lft forever\n",
                            i + 100,
                            l.name,
                            addr,
                            l.name
                        ));
                    }
                }
                CommandOutput::ok(out)
            }
            SwitchCommand::LinkInfo { dev } => match switch.link(dev) {
                Some(l) => CommandOutput::ok(format!(
                    "7: {}@{}: <BROADCAST,MULTICAST,UP,LOWER_UP> mtu 1500 qdisc noqueue state UP \
                     mode DEFAULT group default qlen 1000\\    link/ether {} brd ff:ff:ff:ff:ff:ff\n",
                    l.name, l.peer, l.mac
                )),
                None => CommandOutput::failed(format!("Device \"{}\" does not exist.", dev)),
            },
            SwitchCommand::Dump { target, .. } => match target {
                DumpTarget::Flows | DumpTarget::FlowCount => CommandOutput::ok(FLOWS),
                DumpTarget::OvsShow => CommandOutput::ok("    Bridge br-int\n        fail_mode: secure\n"),
                other => CommandOutput::ok(format!("OFPST_{} reply (OF1.3) (xid=0x2):\n", other)),
            },
            SwitchCommand::Ping { .. } => unreachable!(),
            SwitchCommand::ClearLocalIp | SwitchCommand::DelController { .. } | SwitchCommand::DelManager => {
                CommandOutput::ok("")
            }
        }
    }
}

impl ContainerDriver for FakeFleet {
    fn find_image(&self) -> anyhow::Result<Option<String>> {
        Ok(self.image.clone())
    }

    fn run_switch(&self, launch: &SwitchLaunch) -> anyhow::Result<CommandOutput> {
        self.log(format!("run {} {}", launch.name, launch.mode()));
        let mut switches = self.switches.borrow_mut();
        if switches.contains_key(&launch.name) {
            return Ok(CommandOutput::failed(format!(
                "docker: Error response from daemon: Conflict. The container name \"/{}\" is already in use.",
                launch.name
            )));
        }
        switches.insert(launch.name.clone(), Switch::default());
        Ok(CommandOutput::ok("8c0b0f4b7d6e\n"))
    }

    fn stop(&self, name: &str) -> anyhow::Result<CommandOutput> {
        self.log(format!("stop {}", name));
        if self.switches.borrow().contains_key(name) {
            Ok(CommandOutput::ok(format!("{}\n", name)))
        } else {
            Ok(CommandOutput::failed(format!("Error: No such container: {}", name)))
        }
    }

    fn remove(&self, name: &str) -> anyhow::Result<CommandOutput> {
        self.log(format!("rm {}", name));
        match self.switches.borrow_mut().remove(name) {
            Some(_) => Ok(CommandOutput::ok(format!("{}\n", name))),
            None => Ok(CommandOutput::failed(format!("Error: No such container: {}", name))),
        }
    }

    fn inspect(&self, name: &str) -> anyhow::Result<CommandOutput> {
        if !self.switches.borrow().contains_key(name) {
            return Ok(CommandOutput::failed(format!("Error: No such object: {}", name)));
        }
        let doc = json!([{
            "Name": format!("/{}", name),
            "State": { "Status": "running", "Running": true },
            "Config": { "Image": self.image },
        }]);
        Ok(CommandOutput::ok(serde_json::to_string_pretty(&doc)?))
    }

    fn exec(&self, name: &str, cmd: &SwitchCommand) -> anyhow::Result<CommandOutput> {
        self.log(format!("exec {} {}", name, cmd.describe()));
        let mut switches = self.switches.borrow_mut();
        Ok(self.run_in(&mut switches, name, cmd))
    }

    fn list_switches(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.switches.borrow().keys().cloned().collect())
    }
}

/// Controller that accepts (or rejects) every request and remembers it.
#[derive(Default)]
pub struct FakeController {
    reject: bool,
    calls: RefCell<Vec<String>>,
    ports: RefCell<Vec<Value>>,
    journal: Journal,
}

impl FakeController {
    pub fn rejecting() -> FakeController {
        FakeController {
            reject: true,
            ..FakeController::default()
        }
    }

    /// Record calls into the fleet's journal as well.
    pub fn sharing_journal(fleet: &FakeFleet) -> FakeController {
        FakeController {
            journal: Rc::clone(&fleet.journal),
            ..FakeController::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn ports(&self) -> Vec<Value> {
        self.ports.borrow().clone()
    }

    fn answer(&self, call: String) -> anyhow::Result<CommandOutput> {
        self.journal.borrow_mut().push(call.clone());
        self.calls.borrow_mut().push(call);
        if self.reject {
            Ok(CommandOutput::failed(
                "curl: (22) The requested URL returned error: 409 Conflict",
            ))
        } else {
            Ok(CommandOutput::ok(""))
        }
    }

    fn post(&self, collection: &str, key: &str, body: &Value) -> anyhow::Result<CommandOutput> {
        let id = body[key]["id"].as_str().unwrap_or("?");
        self.answer(format!("POST {} {}", collection, id))
    }
}

impl ControllerClient for FakeController {
    fn create_network(&self, body: &Value) -> anyhow::Result<CommandOutput> {
        self.post("networks", "network", body)
    }

    fn create_subnet(&self, body: &Value) -> anyhow::Result<CommandOutput> {
        self.post("subnets", "subnet", body)
    }

    fn create_port(&self, body: &Value) -> anyhow::Result<CommandOutput> {
        self.ports.borrow_mut().push(body.clone());
        self.post("ports", "port", body)
    }

    fn delete_neutron(&self) -> anyhow::Result<CommandOutput> {
        self.answer("DELETE neutron".to_string())
    }
}
