use crate::{
    config::HarnessConfig,
    ident::container_name,
    range::SwitchRange,
    request::DumpTarget,
    utils::{
        docker::ContainerDriver,
        ovs::{count_flows, SwitchCommand},
        sink::Sink,
    },
};

use super::{exec_checked, BatchReport};

/// Dump each target from every switch in the range, one sink per target.
pub fn run(
    fleet: &dyn ContainerDriver,
    cfg: &HarnessConfig,
    targets: &[DumpTarget],
    range: SwitchRange,
    to_file: bool,
) -> anyhow::Result<BatchReport> {
    let mut report = BatchReport::default();

    for &target in targets {
        let mut sink = Sink::open(&cfg.work_dir, &format!("dump-{}", target), to_file)?;

        for i in range.indices() {
            let name = container_name(i);
            sink.line(&format!(
                "=================== {} {} =====================",
                name, target
            ))?;

            let cmd = SwitchCommand::Dump {
                bridge: cfg.bridge.clone(),
                target,
            };
            let res = exec_checked(fleet, &name, &cmd);
            match &res {
                Ok(out) if target == DumpTarget::FlowCount => {
                    sink.line(&count_flows(out).to_string())?
                }
                Ok(out) => sink.block(out)?,
                Err(e) => sink.line(e)?,
            }
            report.record(format!("{} {}", name, target), res.map(|_| ()));
        }

        sink.finish(&format!("--dump {}", target))?;
    }

    Ok(report)
}
