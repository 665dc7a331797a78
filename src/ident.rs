use std::net::Ipv4Addr;

/// Name of the container running switch number `switch`.
pub fn container_name(switch: u32) -> String {
    format!("ovs{}", switch)
}

/// Prefix length used when assigning port addresses inside a container.
pub const PORT_PREFIX_LEN: u8 = 16;

/// Is this one of the addresses we hand out to VM ports (20.0.0.0/16)?
pub fn is_port_address(addr: &Ipv4Addr) -> bool {
    let [a, b, _, _] = addr.octets();
    a == 20 && b == 0
}

/// Everything that identifies a single emulated VM port on a switch.
///
/// All fields are derived from the switch and port numbers only, so
/// re-running an operation for the same numbers always targets the same
/// objects, both inside the container and on the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortIdentity {
    pub switch: u8,
    pub port: u8,
    pub container: String,
    /// switch side of the veth pair, attached to the bridge
    pub tap_port: String,
    /// guest side of the veth pair, carries the IP address
    pub vm_port: String,
    pub iface_id: String,
    pub device_id: String,
    pub ip: Ipv4Addr,
}

impl PortIdentity {
    pub fn derive(switch: u8, port: u8) -> PortIdentity {
        // minimum width of two, switches above 99 get three digits
        let s = format!("{:02}", switch);
        let p = format!("{:02}", port);

        PortIdentity {
            switch,
            port,
            container: container_name(switch as u32),
            tap_port: format!("tap2d9def{}-{}", s, p),
            vm_port: format!("vm-port{}{}", s, p),
            iface_id: format!("d6c144c2-{s}{s}-{p}{p}-ba74-ceaf8df1ac17"),
            device_id: format!("e957c01d-{s}{s}-{p}{p}-b79e-17aae1a6733d"),
            ip: Ipv4Addr::new(20, 0, switch, port),
        }
    }

    /// Address with prefix, as given to `ip addr add`.
    pub fn cidr(&self) -> String {
        format!("{}/{}", self.ip, PORT_PREFIX_LEN)
    }
}
