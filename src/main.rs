//! netbootd - network boot request daemon.

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use netbootd::config::{Config, DEFAULT_CONFIG_PATH};
use netbootd::directory::{AccessList, LeaseTable, ResolvConf, SystemResolver};
use netbootd::netconfig::list_interfaces;
use netbootd::reporter::LogReporter;
use netbootd::{BootpServer, HandlerSettings, InterfaceConfig, RequestHandler};

#[derive(Parser)]
#[command(name = "netbootd")]
#[command(about = "BOOTP/DHCP server answering PXE network boot requests")]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Network interface to serve (overrides bind_interface)
    #[arg(short, long)]
    interface: Option<String>,

    /// Listen port (overrides port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;
    if let Some(interface) = args.interface {
        config.bind_interface = interface;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if args.verbose {
        config.log_level = "debug".to_string();
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.tracing_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!("Starting netbootd");
    info!("Config path: {:?}", args.config);

    let netconfig = InterfaceConfig::discover(&config.bind_interface).with_context(|| {
        format!(
            "Cannot use interface {} (available: {})",
            config.bind_interface,
            list_interfaces().join(", ")
        )
    })?;
    info!(
        "Interface {}: address {}, netmask {}",
        netconfig.name, netconfig.address, netconfig.netmask
    );

    let mut server = build_server(&config, netconfig)?;

    let running = server.running_flag();
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl-C handler")?;

    server.run()
}

fn build_server(config: &Config, netconfig: InterfaceConfig) -> Result<BootpServer> {
    let mut handler = RequestHandler::new(HandlerSettings::from(config), netconfig)
        .with_resolver(SystemResolver)
        .with_nameservers(ResolvConf::new(&config.resolv_conf)?)
        .with_reporter(LogReporter::new().with_verbose(config.log_level == "debug"));

    if let Some(path) = &config.leases_file {
        let leases = LeaseTable::load(path)?;
        info!("Loaded {} host records from {}", leases.len(), path.display());
        handler = handler.with_directory(leases);
    }

    if let (Some(mode), Some(path)) = (config.acl, &config.acl_file) {
        let acl = AccessList::load(mode, path)?;
        info!("Access control by {:?} from {}", mode, path.display());
        handler = handler.with_access_control(acl);
    }

    Ok(BootpServer::new(handler, config.ports()))
}
