//! `getVer` handler: firmware identification.

use crate::device::DeviceInfo;
use crate::handlers::{to_object, CommandHandler, Fragment};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct VersionHandler {
    device: Arc<DeviceInfo>,
}

impl VersionHandler {
    pub fn new(device: Arc<DeviceInfo>) -> Self {
        VersionHandler { device }
    }
}

impl CommandHandler for VersionHandler {
    fn commands(&self) -> &'static [&'static str] {
        &["getVer"]
    }

    fn execute(&mut self, command: &str, _query: &Value) -> Option<Fragment> {
        if command != "getVer" {
            return None;
        }

        let mut ver = to_object(json!({
            "name": DeviceInfo::MODEL,
            "fname": self.device.friendly_name(),
            "release_type": "RELEASE_TYPE_OFFICIAL",
        }));
        ver.extend(self.device.version_info());

        Some(to_object(json!({ "ver": ver })))
    }
}
