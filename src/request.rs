use std::{fmt, net::Ipv4Addr, str::FromStr};

/// Everything the user asked for in one invocation.
///
/// Built once from the command line and never modified afterwards. The
/// validator in [`crate::matrix`] decides which single action it maps to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandRequest {
    pub start_switches: Option<u32>,
    pub stop_switches: Option<u32>,
    pub controller_ip: Option<Ipv4Addr>,
    pub dump: Option<Vec<String>>,
    pub range: Option<Vec<String>>,
    pub output_file: bool,
    pub show_containers_info: Option<u32>,
    pub show_container_count: bool,
    pub create_network: bool,
    pub create_subnet: bool,
    pub del_neutron_data: bool,
    pub add_ports: Option<u8>,
    pub bind_ports: Option<u8>,
    pub del_ports: Option<u8>,
    pub create_ping_ips_file: bool,
    pub ping_all: bool,
    pub cleanup: bool,
}

/// Diagnostic snapshot that can be taken from a switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpTarget {
    Flows,
    FlowCount,
    Ports,
    Groups,
    Tables,
    OvsShow,
}

impl DumpTarget {
    /// Declared order, also the order `all` expands to.
    pub const ALL: [DumpTarget; 6] = [
        DumpTarget::Flows,
        DumpTarget::FlowCount,
        DumpTarget::Ports,
        DumpTarget::Groups,
        DumpTarget::Tables,
        DumpTarget::OvsShow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DumpTarget::Flows => "flows",
            DumpTarget::FlowCount => "flow-count",
            DumpTarget::Ports => "ports",
            DumpTarget::Groups => "groups",
            DumpTarget::Tables => "tables",
            DumpTarget::OvsShow => "ovs-show",
        }
    }
}

impl fmt::Display for DumpTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DumpTarget {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DumpTarget::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or(())
    }
}
