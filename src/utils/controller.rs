use std::net::Ipv4Addr;

use serde_json::Value;
use subprocess::Exec;

use super::{capture, CommandOutput};

const NEUTRON_NB: &str = "controller/nb/v2/neutron";
const NEUTRON_CONFIG: &str = "restconf/config/neutron:neutron";

/// The controller's neutron northbound.
pub trait ControllerClient {
    fn create_network(&self, body: &Value) -> anyhow::Result<CommandOutput>;

    fn create_subnet(&self, body: &Value) -> anyhow::Result<CommandOutput>;

    fn create_port(&self, body: &Value) -> anyhow::Result<CommandOutput>;

    /// Wipe networks, subnets and ports.
    fn delete_neutron(&self) -> anyhow::Result<CommandOutput>;
}

/// Talks to the controller through `curl`.
///
/// `--fail` makes curl exit non-zero on HTTP errors, so the exit status is
/// the acknowledgement of every request.
pub struct CurlController {
    base_url: String,
    auth: String,
}

impl CurlController {
    pub fn new(ip: Ipv4Addr, port: u16, auth: impl Into<String>) -> Self {
        CurlController {
            base_url: format!("http://{}:{}", ip, port),
            auth: auth.into(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn curl(&self, method: &str, path: &str) -> Exec {
        Exec::cmd("curl").args(&[
            "-sS",
            "--fail",
            "-u",
            &self.auth,
            "-H",
            "Content-Type: application/json",
            "-X",
            method,
            &self.url(path),
        ])
    }

    fn post(&self, path: &str, body: &Value) -> anyhow::Result<CommandOutput> {
        let body = serde_json::to_string(body)?;
        capture(self.curl("POST", path).args(&["--data", "@-"]).stdin(body.as_str()))
    }
}

impl ControllerClient for CurlController {
    fn create_network(&self, body: &Value) -> anyhow::Result<CommandOutput> {
        self.post(&format!("{}/networks", NEUTRON_NB), body)
    }

    fn create_subnet(&self, body: &Value) -> anyhow::Result<CommandOutput> {
        self.post(&format!("{}/subnets", NEUTRON_NB), body)
    }

    fn create_port(&self, body: &Value) -> anyhow::Result<CommandOutput> {
        self.post(&format!("{}/ports", NEUTRON_NB), body)
    }

    fn delete_neutron(&self) -> anyhow::Result<CommandOutput> {
        capture(self.curl("DELETE", NEUTRON_CONFIG))
    }
}
