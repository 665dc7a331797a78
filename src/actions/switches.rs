use std::{
    net::Ipv4Addr,
    thread::sleep,
    time::{Duration, Instant},
};

use crate::{
    config::HarnessConfig,
    ident::container_name,
    utils::{
        docker::{ContainerDriver, SwitchLaunch},
        ovs::SwitchCommand,
        sink::Sink,
    },
};

use super::{exec_all, BatchReport};

const READY_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Start `count` new switches, numbered after the ones already running.
pub fn start(
    fleet: &dyn ContainerDriver,
    cfg: &HarnessConfig,
    count: u32,
    controller: Ipv4Addr,
) -> anyhow::Result<BatchReport> {
    let mut report = BatchReport::default();

    let image = match fleet.find_image()? {
        Some(image) => image,
        None => {
            error!(
                "no docker image matching '{}' to run the containers",
                cfg.image_filter
            );
            return Ok(report);
        }
    };

    let first = fleet.switch_count()? as u32 + 1;
    for i in first..first + count {
        let launch = SwitchLaunch {
            name: container_name(i),
            controller,
            image: image.clone(),
        };

        let res = fleet
            .run_switch(&launch)
            .map_err(|e| format!("{:#}", e))
            .and_then(|out| out.check("docker run"))
            .and_then(|_| wait_ready(fleet, &launch.name, cfg.ready_timeout()));

        match &res {
            Ok(()) => info!("Started docker container {}.", launch.name),
            Err(e) => error!("failed to start {}: {}", launch.name, e),
        }
        report.record(launch.name, res);
    }

    Ok(report)
}

/// Poll the switch until `ovs-vsctl show` answers.
pub fn wait_ready(
    fleet: &dyn ContainerDriver,
    name: &str,
    timeout: Duration,
) -> Result<(), String> {
    let deadline = Instant::now() + timeout;
    loop {
        if matches!(fleet.exec(name, &SwitchCommand::Show), Ok(out) if out.success) {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(format!("switch not ready after {:?}", timeout));
        }
        sleep(READY_POLL_INTERVAL);
    }
}

/// Stop and remove the first `count` switches in name order.
pub fn stop(
    fleet: &dyn ContainerDriver,
    cfg: &HarnessConfig,
    count: u32,
) -> anyhow::Result<BatchReport> {
    let mut report = BatchReport::default();
    let names = fleet.list_switches()?;

    let count = count as usize;
    if count > names.len() {
        warn!(
            "asked to stop {} switches but only {} are running",
            count,
            names.len()
        );
    }

    for name in names.iter().take(count) {
        let res = stop_one(fleet, cfg, name);
        match &res {
            Ok(()) => info!("Stopped docker container {}.", name),
            Err(e) => error!("failed to stop {}: {}", name, e),
        }
        report.record(name.as_str(), res);
    }

    Ok(report)
}

fn stop_one(fleet: &dyn ContainerDriver, cfg: &HarnessConfig, name: &str) -> Result<(), String> {
    // dropping local_ip makes the controller tear down the tunnels,
    // there is nothing to wait on so give it some time
    if let Err(e) = exec_all(fleet, name, &[SwitchCommand::ClearLocalIp]) {
        warn!("{}: {}", name, e);
    }
    sleep(cfg.settle());

    let disconnect = [
        SwitchCommand::DelController {
            bridge: cfg.bridge.clone(),
        },
        SwitchCommand::DelManager,
    ];
    if let Err(e) = exec_all(fleet, name, &disconnect) {
        warn!("{}: {}", name, e);
    }

    fleet
        .stop(name)
        .map_err(|e| format!("{:#}", e))?
        .check("docker stop")?;
    fleet
        .remove(name)
        .map_err(|e| format!("{:#}", e))?
        .check("docker rm")?;

    Ok(())
}

/// `docker inspect` of switches 1..=count.
pub fn show_info(
    fleet: &dyn ContainerDriver,
    cfg: &HarnessConfig,
    count: u32,
    to_file: bool,
) -> anyhow::Result<BatchReport> {
    let mut report = BatchReport::default();
    let mut sink = Sink::open(&cfg.work_dir, "show-container", to_file)?;

    for i in 1..=count {
        let name = container_name(i);
        let out = fleet.inspect(&name)?;
        sink.block(&out.output)?;
        report.record(name, out.check("docker inspect").map(|_| ()));
    }

    sink.finish("--show-containers-info")?;
    Ok(report)
}
