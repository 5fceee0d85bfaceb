//! Identity and lifetime facts about the simulated device.
//!
//! One `DeviceInfo` value is created at startup and shared by the handlers
//! that report it, so version and status replies always agree.

use serde_json::{Map, Value};
use std::time::Instant;

/// The simulated device: name, firmware version, and process uptime.
#[derive(Debug)]
pub struct DeviceInfo {
    start: Instant,
}

impl DeviceInfo {
    /// Short model identifier reported in version replies.
    pub const MODEL: &'static str = "RCP_MK3";

    pub fn new() -> Self {
        DeviceInfo {
            start: Instant::now(),
        }
    }

    pub fn friendly_name(&self) -> &'static str {
        "RaceCapture/Pro MK3"
    }

    /// Whole seconds since the simulator started (monotonic clock).
    pub fn uptime_secs(&self) -> u64 {
        self.start.elapsed().as_secs()
    }

    /// Firmware version fields, shared by the version and status replies.
    pub fn version_info(&self) -> Map<String, Value> {
        let mut info = Map::new();
        info.insert("major".into(), 2.into());
        info.insert("minor".into(), 18.into());
        info.insert("bugfix".into(), 4.into());
        info.insert("serial".into(), "1234567890".into());
        info.insert("git_info".into(), "2.18.4".into());
        info
    }
}

impl Default for DeviceInfo {
    fn default() -> Self {
        Self::new()
    }
}
