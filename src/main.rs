#[macro_use]
extern crate log;

use std::net::Ipv4Addr;

use clap::Parser;
use config::HarnessConfig;
use request::CommandRequest;
use utils::docker::DockerCli;

mod actions;
mod config;
mod ident;
mod matrix;
mod range;
mod request;
mod utils;

/// Emulate a fleet of OVS compute nodes in docker containers attached to an
/// SDN controller.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Start this many new switch containers (needs --controller-ip)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=200))]
    start_switches: Option<u32>,

    /// Stop and remove this many switch containers
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=200))]
    stop_switches: Option<u32>,

    /// Address of the SDN controller
    #[arg(long)]
    controller_ip: Option<Ipv4Addr>,

    /// Comma separated list of flows, flow-count, ports, groups, tables, ovs-show or all
    #[arg(long, value_delimiter = ',')]
    dump: Option<Vec<String>>,

    /// Switch range START,END for --dump, --create-ping-ips-file and --ping-all
    #[arg(long, value_delimiter = ',')]
    range: Option<Vec<String>>,

    /// Write the output of the action into a timestamped file in the work directory
    #[arg(long, action)]
    output_file: bool,

    /// Show `docker inspect` of the first N switches
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=200))]
    show_containers_info: Option<u32>,

    /// Print the number of switch containers
    #[arg(long, action)]
    show_container_count: bool,

    /// Create the neutron network from network.json
    #[arg(long, action)]
    create_network: bool,

    /// Create the neutron subnet from subnetwork.json
    #[arg(long, action)]
    create_subnet: bool,

    /// Delete all neutron networks, subnets and ports
    #[arg(long, action)]
    del_neutron_data: bool,

    /// Add N VM ports to every switch
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=30))]
    add_ports: Option<u8>,

    /// Create neutron ports for the first N VM ports of every switch
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=30))]
    bind_ports: Option<u8>,

    /// Delete the first N VM ports of every switch
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=30))]
    del_ports: Option<u8>,

    /// Collect the VM port addresses of the switch range into the ping list
    #[arg(long, action)]
    create_ping_ips_file: bool,

    /// Ping every address of the ping list from the VM ports of the switch range
    #[arg(long, action)]
    ping_all: bool,

    /// Remove ports, neutron data, switches and output files
    #[arg(long, action)]
    cleanup: bool,

    #[command(flatten)]
    config: HarnessConfig,
}

impl Args {
    fn request(&self) -> CommandRequest {
        CommandRequest {
            start_switches: self.start_switches,
            stop_switches: self.stop_switches,
            controller_ip: self.controller_ip,
            dump: self.dump.clone(),
            range: self.range.clone(),
            output_file: self.output_file,
            show_containers_info: self.show_containers_info,
            show_container_count: self.show_container_count,
            create_network: self.create_network,
            create_subnet: self.create_subnet,
            del_neutron_data: self.del_neutron_data,
            add_ports: self.add_ports,
            bind_ports: self.bind_ports,
            del_ports: self.del_ports,
            create_ping_ips_file: self.create_ping_ips_file,
            ping_all: self.ping_all,
            cleanup: self.cleanup,
        }
    }
}

fn main() -> anyhow::Result<()> {
    if std::env::args_os().len() <= 1 {
        println!("No arguments specified.");
        return Ok(());
    }

    // parse command line arguments
    let args = Args::parse();

    // init logging
    simple_logger::init_with_level(args.config.log_level)?;

    let request = args.request();
    let action = match matrix::resolve(&request) {
        Ok(action) => action,
        Err(e) => {
            error!("{}", e);
            return Ok(());
        }
    };
    let ignored = matrix::ignored_flags(&request, &action);
    if !ignored.is_empty() {
        warn!("ignoring --{} for this action", ignored.join(", --"));
    }
    debug!("resolved {:?}", action);

    let fleet = DockerCli::new(args.config.image_filter.as_str());
    let report = actions::perform(action, &fleet, &args.config)?;
    report.log_summary();

    Ok(())
}
