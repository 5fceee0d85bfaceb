//! `getStatus` handler: system, GPS, and logging status fixture.

use crate::device::DeviceInfo;
use crate::handlers::{to_object, CommandHandler, Fragment};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct StatusHandler {
    device: Arc<DeviceInfo>,
}

impl StatusHandler {
    pub fn new(device: Arc<DeviceInfo>) -> Self {
        StatusHandler { device }
    }
}

impl CommandHandler for StatusHandler {
    fn commands(&self) -> &'static [&'static str] {
        &["getStatus"]
    }

    fn execute(&mut self, command: &str, _query: &Value) -> Option<Fragment> {
        if command != "getStatus" {
            return None;
        }

        let mut system = to_object(json!({
            "model": self.device.friendly_name(),
            "uptime": self.device.uptime_secs(),
        }));
        system.extend(self.device.version_info());

        Some(to_object(json!({
            "status": {
                "system": system,
                "GPS": {
                    "init": 1, // provisioned
                    "qual": 2, // 3D fix
                    "lat": 37.7749,
                    "lon": -122.4194,
                    "sats": 6,
                    "DOP": 0.5,
                },
                "bt": {
                    "init": 0, // not initialized
                },
                "logging": {
                    "status": 3, // card not present
                    "dur": 0,
                },
                "track": {
                    "status": 0,
                    "valid": false,
                    "trackId": 0,
                    "inLap": 0,
                    "armed": 0,
                },
            },
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_fragment_shape() {
        let mut handler = StatusHandler::new(Arc::new(DeviceInfo::new()));
        let fragment = handler.execute("getStatus", &Value::Null).unwrap();

        let status = fragment["status"].as_object().unwrap();
        let system = status["system"].as_object().unwrap();
        assert_eq!(system["model"], "RaceCapture/Pro MK3");
        assert!(system["uptime"].is_u64());
        assert_eq!(system["major"], 2);
        assert_eq!(system["git_info"], "2.18.4");

        assert_eq!(status["GPS"]["qual"], 2);
        assert_eq!(status["GPS"]["lat"], 37.7749);
        assert_eq!(status["bt"]["init"], 0);
        assert_eq!(status["logging"]["status"], 3);
        assert_eq!(status["track"]["valid"], false);
    }

    #[test]
    fn test_foreign_command_declined() {
        let mut handler = StatusHandler::new(Arc::new(DeviceInfo::new()));
        assert!(handler.execute("getLapCfg", &Value::Null).is_none());
    }
}
