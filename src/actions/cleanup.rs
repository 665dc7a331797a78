use std::{fs, io, path::Path};

use crate::{
    config::HarnessConfig,
    utils::{controller::ControllerClient, docker::ContainerDriver},
};

use super::{neutron, ping::port_ips, ports, switches, BatchReport};

/// Tear everything down.
///
/// Ports go first, then the controller state they were bound to, then the
/// containers, and finally the output files left behind in the work directory.
pub fn run(
    fleet: &dyn ContainerDriver,
    controller: &dyn ControllerClient,
    cfg: &HarnessConfig,
) -> anyhow::Result<BatchReport> {
    let names = fleet.list_switches()?;

    // the first switch is taken as representative for all of them
    let port_count = match names.first() {
        Some(first) => port_ips(fleet, first).map(|ips| ips.len()).unwrap_or(0),
        None => 0,
    };
    let port_count = u8::try_from(port_count).unwrap_or(u8::MAX);

    let mut report = BatchReport::default();
    report.merge(ports::delete(fleet, cfg, port_count)?);
    report.merge(neutron::del_neutron_data(controller)?);
    report.merge(switches::stop(fleet, cfg, names.len() as u32)?);

    let removed = remove_output_files(&cfg.work_dir)?;
    info!(
        "Removed {} output files from {} dir.",
        removed,
        cfg.work_dir.display()
    );

    Ok(report)
}

fn is_output_file(name: &str) -> bool {
    name.ends_with(".txt")
        && (name.starts_with("show-container-out")
            || name.starts_with("dump-")
            || name.starts_with("ping"))
}

/// Delete show-container, dump and ping output files, returns how many.
pub fn remove_output_files(dir: &Path) -> io::Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let matches = name.to_str().map_or(false, is_output_file);
        if matches && entry.file_type()?.is_file() {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}
