//! `getCapabilities` handler: the fixed feature set the simulated hardware
//! advertises to clients.

use crate::handlers::{to_object, CommandHandler, Fragment};
use serde_json::{json, Value};

#[derive(Default)]
pub struct CapabilitiesHandler;

impl CapabilitiesHandler {
    pub fn new() -> Self {
        CapabilitiesHandler
    }
}

impl CommandHandler for CapabilitiesHandler {
    fn commands(&self) -> &'static [&'static str] {
        &["getCapabilities"]
    }

    fn execute(&mut self, command: &str, _query: &Value) -> Option<Fragment> {
        if command != "getCapabilities" {
            return None;
        }

        Some(to_object(json!({
            "capabilities": {
                "flags": [
                    "activetrack",
                    "adc",
                    "can",
                    "can_term",
                    "gpio",
                    "gps",
                    "imu",
                    "odb2",
                    "pwm",
                    "telemstream",
                    "tracks",
                    "timer",
                    "usb",
                    "sd",
                ],
                "channels": {
                    "analog": 1,
                    "imu": 1,
                    "gpio": 1,
                    "timer": 1,
                    "pwm": 1,
                    "can": 1,
                    "obd2": 1,
                    "canChan": 1,
                },
                "sampleRates": {
                    "gps": 1,
                    "sensor": 1,
                },
                "db": {
                    "script": 1,
                    "tracks": 1,
                    "sectors": 1,
                },
            },
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_fragment_shape() {
        let mut handler = CapabilitiesHandler::new();
        let fragment = handler.execute("getCapabilities", &Value::Null).unwrap();

        let caps = fragment["capabilities"].as_object().unwrap();
        let flags = caps["flags"].as_array().unwrap();
        assert_eq!(flags.len(), 14);
        assert!(flags.contains(&json!("gps")));
        assert!(flags.contains(&json!("telemstream")));

        assert_eq!(caps["channels"]["canChan"], 1);
        assert_eq!(caps["sampleRates"]["sensor"], 1);
        assert_eq!(caps["db"]["sectors"], 1);
    }

    #[test]
    fn test_foreign_command_declined() {
        let mut handler = CapabilitiesHandler::new();
        assert!(handler.execute("getVer", &Value::Null).is_none());
    }
}
