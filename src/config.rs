//! Configuration module for the device simulator.
//!
//! Supports both command-line arguments and a TOML configuration file.
//! CLI arguments take precedence over config file values.

use crate::link::SocketAddress;
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

/// Command-line arguments for the simulator
#[derive(Parser, Debug)]
#[command(name = "rcp-sim")]
#[command(version = "0.1.0")]
#[command(about = "RaceCapture/Pro device simulator", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Unix domain socket to use; prefix with @ for an abstract socket
    #[arg(short, long)]
    pub socket: Option<String>,

    /// Increase verbosity (-v: command notices, -vv: frame traces)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log filter (trace, debug, info, warn, error); overrides -v
    #[arg(long)]
    pub log_level: Option<String>,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Simulator-related configuration
#[derive(Debug, Deserialize)]
pub struct SimulatorConfig {
    /// Bridge socket address
    #[serde(default = "default_socket")]
    pub socket: String,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            socket: default_socket(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log filter
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_socket() -> String {
    "@bdr-pi-tty-bridge-socket".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub socket: SocketAddress,
    pub log_level: String,
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn load() -> Result<Self, ConfigError> {
        Self::resolve(CliArgs::parse())
    }

    fn resolve(cli: CliArgs) -> Result<Self, ConfigError> {
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        let socket = cli.socket.unwrap_or(toml_config.simulator.socket);
        let log_level = cli
            .log_level
            .or_else(|| verbosity_filter(cli.verbose))
            .unwrap_or(toml_config.logging.level);

        Ok(Config {
            socket: SocketAddress::parse(&socket),
            log_level,
        })
    }
}

/// Map repeated -v flags onto a log filter: default info, -v debug, -vv trace.
fn verbosity_filter(verbose: u8) -> Option<String> {
    match verbose {
        0 => None,
        1 => Some("debug".to_string()),
        _ => Some("trace".to_string()),
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
