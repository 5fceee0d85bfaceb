//! `setTelemetry` handler: stores the requested streaming rate.
//!
//! The reply fragment is empty, so a lone `setTelemetry` produces no reply
//! line at all. Streaming of raw telemetry samples is not simulated.

use crate::handlers::{CommandHandler, Fragment};
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Default)]
pub struct TelemetryHandler {
    /// Requested sample-stream rate; zero or negative means stopped.
    rate: i64,
}

impl TelemetryHandler {
    pub fn new() -> Self {
        TelemetryHandler { rate: 0 }
    }

    #[cfg(test)]
    pub fn rate(&self) -> i64 {
        self.rate
    }
}

impl CommandHandler for TelemetryHandler {
    fn commands(&self) -> &'static [&'static str] {
        &["setTelemetry"]
    }

    fn execute(&mut self, command: &str, query: &Value) -> Option<Fragment> {
        if command != "setTelemetry" {
            return None;
        }

        match query.get("rate").and_then(Value::as_i64) {
            Some(rate) => {
                self.rate = rate;
                debug!(rate, "telemetry rate set");
            }
            None => {
                warn!(query = %query, "setTelemetry without a numeric rate");
            }
        }

        Some(Fragment::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rate_stored_and_fragment_empty() {
        let mut handler = TelemetryHandler::new();
        let fragment = handler.execute("setTelemetry", &json!({ "rate": 5 })).unwrap();
        assert!(fragment.is_empty());
        assert_eq!(handler.rate(), 5);
    }

    #[test]
    fn test_rate_can_be_reset_to_zero() {
        let mut handler = TelemetryHandler::new();
        handler.execute("setTelemetry", &json!({ "rate": 50 })).unwrap();
        handler.execute("setTelemetry", &json!({ "rate": 0 })).unwrap();
        assert_eq!(handler.rate(), 0);
    }

    #[test]
    fn test_missing_rate_tolerated() {
        let mut handler = TelemetryHandler::new();
        handler.execute("setTelemetry", &json!({ "rate": 5 })).unwrap();

        let fragment = handler.execute("setTelemetry", &Value::Null).unwrap();
        assert!(fragment.is_empty());
        // a malformed query leaves the previous rate in place
        assert_eq!(handler.rate(), 5);
    }

    #[test]
    fn test_foreign_command_declined() {
        let mut handler = TelemetryHandler::new();
        assert!(handler.execute("getVer", &Value::Null).is_none());
    }
}
