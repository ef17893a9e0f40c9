//! SmartFeed hub driver.
//!
//! Usage:
//!   smartfeed-driver run
//!   smartfeed-driver status <feeder-id>
//!   smartfeed-driver feed <feeder-id> --portions 2
//!   smartfeed-driver configure <feeder-id>
//!   smartfeed-driver health

use clap::{Parser, Subcommand};
use log::{error, info, warn};
use smartfeed_driver::bridge::{BridgeClient, ReqwestTransport};
use smartfeed_driver::config::{self, Config};
use smartfeed_driver::device::{Device, DeviceStateStore};
use smartfeed_driver::driver::{DeviceLifecycle, FeederDriver, StatusMapper, TokioScheduler};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "smartfeed-driver")]
#[command(about = "Keeps PetSafe SmartFeed feeders in sync through the local bridge")]
struct Cli {
    /// Bridge host (defaults to 127.0.0.1)
    #[arg(long, env = "BRIDGE_HOST")]
    host: Option<String>,

    /// Bridge port (defaults to 5000)
    #[arg(long, env = "BRIDGE_PORT")]
    port: Option<u16>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive every feeder listed in FEEDERS until Ctrl+C
    Run,
    /// Fetch and print one feeder's status
    Status {
        /// Feeder id (thing name)
        id: String,
    },
    /// Dispense food once
    Feed {
        /// Feeder id (thing name)
        id: String,

        /// Portions to dispense (defaults to FEED_PORTIONS or 1)
        #[arg(long)]
        portions: Option<u32>,
    },
    /// Check that the bridge can reach a feeder
    Configure {
        /// Feeder id (thing name)
        id: String,
    },
    /// Probe the bridge health endpoint
    Health,
}

fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_millis()
        .init();
}

fn main() -> ExitCode {
    // Load .env file before anything else
    config::load_dotenv();

    let cli = Cli::parse();
    init_logger(cli.verbose);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to start tokio runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> ExitCode {
    let mut config = Config::from_env();
    if let Some(host) = cli.host {
        config.bridge.host = Some(host);
    }
    if let Some(port) = cli.port {
        config.bridge.port = Some(port);
    }

    let transport = match ReqwestTransport::new(config.bridge.request_timeout()) {
        Ok(t) => t,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let client = BridgeClient::new(Arc::new(transport));

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_driver(config, client).await,
        Commands::Status { id } => {
            let device = one_shot_device(&config, id);
            match client.fetch_status(&device).await {
                Ok(payload) => {
                    match serde_json::to_string_pretty(&payload) {
                        Ok(json) => println!("{}", json),
                        Err(e) => warn!("Failed to render status: {}", e),
                    }
                    for event in StatusMapper::new(config.driver.battery).map(&payload) {
                        println!("  -> {}", event);
                    }
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!("Status request failed: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Feed { id, portions } => {
            let device = one_shot_device(&config, id);
            let portions = portions.unwrap_or_else(|| device.preferences.portions());
            match client.trigger_feed(&device, portions).await {
                Ok(result) if result.is_success() => {
                    println!("Dispensed {} portion(s) on {}", portions, device.network_id);
                    ExitCode::SUCCESS
                }
                Ok(result) => {
                    error!("Bridge did not confirm feed: status={}", result.status);
                    ExitCode::FAILURE
                }
                Err(e) => {
                    error!("Feed request failed: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Configure { id } => {
            let device = one_shot_device(&config, id);
            let driver = FeederDriver::new(
                client,
                Arc::new(DeviceStateStore::new()),
                Arc::new(TokioScheduler::new()),
                config.driver,
            );
            if DeviceLifecycle::new(driver).do_configure(&device).await {
                println!("{} is reachable", device.network_id);
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Commands::Health => match client.health(&config.bridge.preferences()).await {
            Ok(health) if health.is_healthy() => {
                println!("Bridge is healthy");
                ExitCode::SUCCESS
            }
            Ok(health) => {
                error!("Bridge reported status: {}", health.status);
                ExitCode::FAILURE
            }
            Err(e) => {
                error!("Health check failed: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

fn one_shot_device(config: &Config, id: String) -> Device {
    Device::new(id.clone(), id).with_preferences(config.bridge.preferences())
}

async fn run_driver(config: Config, client: BridgeClient) -> ExitCode {
    let devices = config.devices();
    if devices.is_empty() {
        error!("No feeders configured, set FEEDERS=<id>[:<label>],...");
        return ExitCode::FAILURE;
    }

    info!("Starting SmartFeed driver");
    info!("  Bridge: {}", BridgeClient::base_url(&config.bridge.preferences()));
    info!("  Poll interval: {:?}", config.driver.poll_interval);
    info!("  Feeders: {}", devices.len());

    let store = Arc::new(DeviceStateStore::new());
    let scheduler = Arc::new(TokioScheduler::new());
    let driver = FeederDriver::new(client, store.clone(), scheduler, config.driver);
    let lifecycle = DeviceLifecycle::new(driver);

    for device in &devices {
        if !lifecycle.do_configure(device).await {
            warn!(
                "{} not reachable yet, polling will keep trying",
                device.label
            );
        }
        lifecycle.added(device).await;
    }

    info!("SmartFeed driver is running, press Ctrl+C to exit");

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }

    for device in &devices {
        lifecycle.removed(device);
        if let Some(state) = store.remove(&device.network_id) {
            info!(
                "  {}: battery={:?} online={:?} switch={:?}",
                device.label, state.battery, state.online, state.switch
            );
        }
    }

    info!("SmartFeed driver stopped");
    ExitCode::SUCCESS
}
