//! rcp-sim: a RaceCapture/Pro device simulator
//!
//! Plays the device end of the tty bridge socket so client software can be
//! exercised without physical hardware.
//!
//! Features:
//! - Newline-delimited JSON command protocol with per-command handlers
//! - Version, capabilities, status, and lap-config fixtures; telemetry rate
//! - Pathname or abstract Unix-domain socket addressing
//! - Configuration via CLI arguments or TOML file

mod config;
mod device;
mod dispatch;
mod framing;
mod handlers;
mod link;
mod shutdown;
mod simulator;

use config::Config;
use device::DeviceInfo;
use dispatch::Dispatcher;
use handlers::Registry;
use link::DeviceLink;
use shutdown::ShutdownToken;
use simulator::Simulator;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Duplicate command registration is a configuration defect; refuse to start
    let device = Arc::new(DeviceInfo::new());
    let registry = Registry::with_device_handlers(device)?;

    info!(
        socket = %config.socket,
        commands = ?registry.command_names(),
        "Starting device simulator"
    );

    let shutdown = ShutdownToken::new();
    shutdown.install_signal_handlers()?;

    let link = DeviceLink::new(config.socket.clone());
    let mut simulator = Simulator::new(link, Dispatcher::new(registry), shutdown);
    simulator.run();

    info!("Simulator stopped");
    Ok(())
}
