//! Message dispatch: one request line in, at most one reply line out.
//!
//! A request is a JSON object whose keys are command names and whose values
//! are command-specific queries (or null). Every command is routed through
//! the registry in wire order and the returned fragments are merged into a
//! single reply object, later fragments overwriting colliding keys.

use crate::handlers::Registry;
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

pub struct Dispatcher {
    registry: Registry,
}

impl Dispatcher {
    pub fn new(registry: Registry) -> Self {
        Dispatcher { registry }
    }

    /// Process one complete line. Returns the compact-serialized reply, or
    /// `None` when there is nothing to send (blank or malformed line, all
    /// commands unknown, or only empty fragments).
    pub fn dispatch(&mut self, line: &str) -> Option<String> {
        if line.trim().is_empty() {
            return None;
        }

        let payload: Map<String, Value> = match serde_json::from_str(line) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "dropping malformed message");
                return None;
            }
        };

        let mut response = Map::new();
        for (command, query) in &payload {
            if let Some(fragment) = self.registry.execute(command, query) {
                response.extend(fragment);
            } else if !self.registry.contains(command) {
                debug!(command = %command, query = %query, "unknown command");
            }
        }

        if response.is_empty() {
            trace!("no response");
            return None;
        }

        match serde_json::to_string(&response) {
            Ok(reply) => Some(reply),
            Err(e) => {
                warn!(error = %e, "failed to serialize response");
                None
            }
        }
    }
}
