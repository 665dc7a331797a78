use std::{path::PathBuf, time::Duration};

use clap::Args;
use log::Level;

/// Knobs of the harness itself, shared by every action.
#[derive(Args, Debug, Clone)]
pub struct HarnessConfig {
    /// Directory holding the neutron templates, the ping list and output files
    #[arg(long, default_value = "/tmp")]
    pub work_dir: PathBuf,

    /// Reference filter used to find the switch image (`docker images -q`)
    #[arg(long, default_value_t = String::from("*dockernet*"))]
    pub image_filter: String,

    /// Integration bridge inside the switch containers
    #[arg(long, default_value_t = String::from("br-int"))]
    pub bridge: String,

    /// Port of the controller's REST interface
    #[arg(long, default_value_t = 8181)]
    pub controller_port: u16,

    /// Basic auth credentials for the controller, `user:password`
    #[arg(long, default_value_t = String::from("admin:admin"))]
    pub controller_auth: String,

    /// Pause after operations that give no completion signal
    #[arg(long, default_value_t = 2000)]
    pub settle_ms: u64,

    /// How long to wait for a freshly started switch to answer
    #[arg(long, default_value_t = 30)]
    pub ready_timeout_secs: u64,

    #[arg(long, default_value_t = Level::Info)]
    pub log_level: Level,
}

impl HarnessConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }

    pub fn ping_ips_file(&self) -> PathBuf {
        self.work_dir.join("docker_ping_ips.txt")
    }
}
