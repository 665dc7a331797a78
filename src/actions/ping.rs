use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    net::Ipv4Addr,
    path::Path,
};

use anyhow::Context;

use crate::{
    config::HarnessConfig,
    ident::container_name,
    range::SwitchRange,
    utils::{
        docker::ContainerDriver,
        ovs::{parse_port_addresses, ping_passed, SwitchCommand},
        sink::Sink,
    },
};

use super::{exec_checked, BatchReport};

/// VM port addresses currently configured in the container.
pub fn port_ips(fleet: &dyn ContainerDriver, name: &str) -> Result<Vec<Ipv4Addr>, String> {
    exec_checked(fleet, name, &SwitchCommand::ListAddresses).map(|out| parse_port_addresses(&out))
}

/// Write the VM port addresses of all switches in the range into the ping list.
pub fn create_ping_ips_file(
    fleet: &dyn ContainerDriver,
    cfg: &HarnessConfig,
    range: SwitchRange,
) -> anyhow::Result<BatchReport> {
    let path = cfg.ping_ips_file();
    let file = File::create(&path)
        .with_context(|| format!("failed to create '{}'", path.display()))?;
    let mut out = BufWriter::new(file);

    let mut report = BatchReport::default();
    for i in range.indices() {
        let name = container_name(i);
        let res = port_ips(fleet, &name);
        if let Ok(ips) = &res {
            for ip in ips {
                writeln!(out, "{}", ip)?;
            }
        }
        report.record(name, res.map(|_| ()));
    }
    out.flush()?;

    info!(
        "Created file {} containing IP addresses of VM ports in DPNs.",
        path.display()
    );
    Ok(report)
}

pub fn read_ping_ips(path: &Path) -> anyhow::Result<Vec<Ipv4Addr>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read ping list '{}'", path.display()))?;

    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| {
            l.parse()
                .with_context(|| format!("invalid address '{}' in {}", l, path.display()))
        })
        .collect()
}

/// Ping every address of the ping list from every VM port of the switches in range.
pub fn ping_all(
    fleet: &dyn ContainerDriver,
    cfg: &HarnessConfig,
    range: SwitchRange,
    to_file: bool,
) -> anyhow::Result<BatchReport> {
    let targets = read_ping_ips(&cfg.ping_ips_file())?;
    let mut sink = Sink::open(&cfg.work_dir, "ping-ips", to_file)?;

    let mut report = BatchReport::default();
    for i in range.indices() {
        let name = container_name(i);
        sink.line(&format!(
            "================== PING from {} switch ==================",
            name
        ))?;

        let sources = match port_ips(fleet, &name) {
            Ok(sources) => sources,
            Err(e) => {
                warn!("no VM ports found on {}: {}", name, e);
                report.record(name, Err(e));
                continue;
            }
        };

        for src in &sources {
            for dst in &targets {
                let cmd = SwitchCommand::Ping {
                    src: *src,
                    dst: *dst,
                };
                let passed = matches!(fleet.exec(&name, &cmd), Ok(out) if ping_passed(&out));
                let verdict = if passed { "PASSED" } else { "FAILED" };
                sink.line(&format!("ping src={} dst={} {}.", src, dst, verdict))?;

                let res = if passed {
                    Ok(())
                } else {
                    Err("ping failed".to_string())
                };
                report.record(format!("{} {} -> {}", name, src, dst), res);
            }
        }
    }

    sink.finish("--ping-all")?;
    Ok(report)
}
