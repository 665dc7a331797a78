//! Neutron request bodies.
//!
//! Network and subnet bodies are sent exactly as they are stored in the work
//! directory. Port bodies are built per port, either from `port.json` (string
//! values naming a placeholder are replaced) or from a built-in body.

use std::{fs, path::PathBuf};

use anyhow::Context;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::ident::PortIdentity;

pub const NETWORK_TEMPLATE: &str = "network.json";
pub const SUBNET_TEMPLATE: &str = "subnetwork.json";
pub const PORT_TEMPLATE: &str = "port.json";

#[derive(Debug, Deserialize)]
struct Identified {
    id: String,
}

#[derive(Debug, Deserialize)]
struct NetworkDoc {
    network: Identified,
}

#[derive(Debug, Deserialize)]
struct SubnetDoc {
    subnet: Identified,
}

/// Values substituted into a port body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortBinding {
    pub iface_id: String,
    pub device_id: String,
    pub name: String,
    pub mac: String,
    pub ip: String,
    pub network_id: String,
    pub subnet_id: String,
    pub port_security: bool,
}

impl PortBinding {
    pub fn new(id: &PortIdentity, mac: String, network_id: &str, subnet_id: &str) -> Self {
        PortBinding {
            iface_id: id.iface_id.clone(),
            device_id: id.device_id.clone(),
            name: id.tap_port.clone(),
            mac,
            ip: id.ip.to_string(),
            network_id: network_id.to_string(),
            subnet_id: subnet_id.to_string(),
            port_security: false,
        }
    }

    fn placeholder(&self, name: &str) -> Option<Value> {
        let v = match name {
            "OVS_IFACE_ID" => Value::from(self.iface_id.as_str()),
            "DEVICE_ID" => Value::from(self.device_id.as_str()),
            "PORT_NAME" => Value::from(self.name.as_str()),
            "PORT_MAC_ADDR" => Value::from(self.mac.as_str()),
            "PORT_IP_ADDR" => Value::from(self.ip.as_str()),
            "NETWORK_ID" => Value::from(self.network_id.as_str()),
            "SUBNET_ID" => Value::from(self.subnet_id.as_str()),
            "PORT_SEC_ENABLED" => Value::from(self.port_security),
            _ => return None,
        };
        Some(v)
    }

    /// Fill in a port template.
    pub fn apply(&self, template: &Value) -> Value {
        match template {
            Value::String(s) => self.placeholder(s).unwrap_or_else(|| template.clone()),
            Value::Array(items) => Value::Array(items.iter().map(|i| self.apply(i)).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.apply(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    /// Body used when there is no `port.json`.
    pub fn default_body(&self) -> Value {
        json!({
            "port": {
                "id": self.iface_id,
                "network_id": self.network_id,
                "name": self.name,
                "admin_state_up": true,
                "mac_address": self.mac,
                "fixed_ips": [
                    { "subnet_id": self.subnet_id, "ip_address": self.ip }
                ],
                "device_id": self.device_id,
                "device_owner": "compute:nova",
                "port_security_enabled": self.port_security,
            }
        })
    }
}

/// The JSON templates kept in the work directory.
#[derive(Debug, Clone)]
pub struct Templates {
    dir: PathBuf,
}

impl Templates {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Templates { dir: dir.into() }
    }

    fn read_text(&self, file: &str) -> anyhow::Result<String> {
        let path = self.dir.join(file);
        fs::read_to_string(&path)
            .with_context(|| format!("failed to read template '{}'", path.display()))
    }

    fn parse(&self, file: &str, text: &str) -> anyhow::Result<Value> {
        serde_json::from_str(text).with_context(|| {
            format!("template '{}' is not valid JSON", self.path(file).display())
        })
    }

    fn read(&self, file: &str) -> anyhow::Result<Value> {
        let text = self.read_text(file)?;
        self.parse(file, &text)
    }

    pub fn network(&self) -> anyhow::Result<Value> {
        self.read(NETWORK_TEMPLATE)
    }

    pub fn subnet(&self) -> anyhow::Result<Value> {
        self.read(SUBNET_TEMPLATE)
    }

    pub fn network_id(&self) -> anyhow::Result<String> {
        let doc: NetworkDoc = serde_json::from_value(self.network()?)
            .context("network template has no network.id")?;
        Ok(doc.network.id)
    }

    pub fn subnet_id(&self) -> anyhow::Result<String> {
        let doc: SubnetDoc = serde_json::from_value(self.subnet()?)
            .context("subnet template has no subnet.id")?;
        Ok(doc.subnet.id)
    }

    /// The port template, if the user provided one.
    pub fn port(&self) -> anyhow::Result<Option<Value>> {
        if !self.path(PORT_TEMPLATE).exists() {
            return Ok(None);
        }
        let text = fill_bare_port_security(&self.read_text(PORT_TEMPLATE)?);
        self.parse(PORT_TEMPLATE, &text).map(Some)
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }
}

/// Port templates may carry `PORT_SEC_ENABLED` unquoted, standing for `false`.
///
/// Quoted occurrences are left alone, [`PortBinding::apply`] handles those.
fn fill_bare_port_security(text: &str) -> String {
    const BARE: &str = "PORT_SEC_ENABLED";

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (i, m) in text.match_indices(BARE) {
        out.push_str(&text[last..i]);
        let quoted = text[..i].ends_with('"') && text[i + m.len()..].starts_with('"');
        out.push_str(if quoted { m } else { "false" });
        last = i + m.len();
    }
    out.push_str(&text[last..]);
    out
}
