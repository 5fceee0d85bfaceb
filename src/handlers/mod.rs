//! Command handlers and their registry.
//!
//! Each handler answers a fixed set of command names with a response
//! fragment. The registry maps command names to handlers and is built once
//! at startup; a command name claimed by two handlers is a configuration
//! error, not a silent override.

mod capabilities;
mod lapconfig;
mod status;
mod telemetry;
mod version;

pub use capabilities::CapabilitiesHandler;
pub use lapconfig::LapConfigHandler;
pub use status::StatusHandler;
pub use telemetry::TelemetryHandler;
pub use version::VersionHandler;

use crate::device::DeviceInfo;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// The partial response a handler contributes for one command, keyed by its
/// own top-level name(s). An empty fragment is a valid "acknowledged, nothing
/// to say" result.
pub type Fragment = Map<String, Value>;

/// A component answering a fixed set of command names.
pub trait CommandHandler: Send {
    /// The command names this handler answers. Never empty.
    fn commands(&self) -> &'static [&'static str];

    /// Answer `command` with a fragment, or `None` if the command is not one
    /// this handler registered. The registry never routes an unregistered
    /// command here, but the contract must hold regardless.
    fn execute(&mut self, command: &str, query: &Value) -> Option<Fragment>;
}

/// Unwrap a JSON object literal into a `Fragment`.
pub(crate) fn to_object(value: Value) -> Fragment {
    match value {
        Value::Object(map) => map,
        _ => unreachable!("fragment literals are objects"),
    }
}

/// Registration errors. Both are startup-time configuration defects.
#[derive(Debug)]
pub enum RegistryError {
    /// Two handlers claimed the same command name.
    DuplicateCommand(String),
    /// A handler declared no commands at all.
    NoCommands,
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryError::DuplicateCommand(cmd) => {
                write!(f, "command '{cmd}' registered by more than one handler")
            }
            RegistryError::NoCommands => {
                write!(f, "handler declared an empty command list")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Maps command names to the handler that answers them.
pub struct Registry {
    handlers: Vec<Box<dyn CommandHandler>>,
    by_command: HashMap<&'static str, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            handlers: Vec::new(),
            by_command: HashMap::new(),
        }
    }

    /// The full device handler set, sharing one `DeviceInfo`.
    pub fn with_device_handlers(device: Arc<DeviceInfo>) -> Result<Self, RegistryError> {
        let mut registry = Registry::new();
        registry.register(Box::new(CapabilitiesHandler::new()))?;
        registry.register(Box::new(LapConfigHandler::new()))?;
        registry.register(Box::new(StatusHandler::new(Arc::clone(&device))))?;
        registry.register(Box::new(TelemetryHandler::new()))?;
        registry.register(Box::new(VersionHandler::new(device)))?;
        Ok(registry)
    }

    /// Register a handler for every command it declares.
    pub fn register(&mut self, handler: Box<dyn CommandHandler>) -> Result<(), RegistryError> {
        let commands = handler.commands();
        if commands.is_empty() {
            return Err(RegistryError::NoCommands);
        }

        for (i, &command) in commands.iter().enumerate() {
            if self.by_command.contains_key(command) || commands[..i].contains(&command) {
                return Err(RegistryError::DuplicateCommand(command.to_owned()));
            }
        }

        let idx = self.handlers.len();
        for &command in commands {
            self.by_command.insert(command, idx);
        }
        self.handlers.push(handler);
        Ok(())
    }

    /// Whether any handler answers `command`.
    pub fn contains(&self, command: &str) -> bool {
        self.by_command.contains_key(command)
    }

    /// Route `command` to its handler. `None` when the command is unknown or
    /// the owning handler declined it.
    pub fn execute(&mut self, command: &str, query: &Value) -> Option<Fragment> {
        let &idx = self.by_command.get(command)?;
        let fragment = self.handlers[idx].execute(command, query);
        if fragment.is_none() {
            debug!(command, "handler declined a registered command");
        }
        fragment
    }

    /// Registered command names, sorted for stable logging.
    pub fn command_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.by_command.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
