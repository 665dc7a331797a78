use crate::{
    config::HarnessConfig,
    utils::{controller::ControllerClient, neutron::Templates},
};

use super::BatchReport;

pub fn create_network(
    controller: &dyn ControllerClient,
    cfg: &HarnessConfig,
) -> anyhow::Result<BatchReport> {
    let body = Templates::new(&cfg.work_dir).network()?;
    let res = controller.create_network(&body)?.check("create network");

    let mut report = BatchReport::default();
    match &res {
        Ok(_) => info!("Created network."),
        Err(e) => error!("{}", e),
    }
    report.record("network", res.map(|_| ()));
    Ok(report)
}

pub fn create_subnet(
    controller: &dyn ControllerClient,
    cfg: &HarnessConfig,
) -> anyhow::Result<BatchReport> {
    let body = Templates::new(&cfg.work_dir).subnet()?;
    let res = controller.create_subnet(&body)?.check("create subnet");

    let mut report = BatchReport::default();
    match &res {
        Ok(_) => info!("Created sub-network."),
        Err(e) => error!("{}", e),
    }
    report.record("subnet", res.map(|_| ()));
    Ok(report)
}

/// Drop networks, subnets and ports on the controller in one request.
pub fn del_neutron_data(controller: &dyn ControllerClient) -> anyhow::Result<BatchReport> {
    let res = controller.delete_neutron()?.check("delete neutron data");

    let mut report = BatchReport::default();
    match &res {
        Ok(_) => info!("Deleted neutron data."),
        Err(e) => error!("{}", e),
    }
    report.record("neutron", res.map(|_| ()));
    Ok(report)
}
