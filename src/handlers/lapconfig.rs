//! `getLapCfg` handler: lap statistics channel metadata.
//!
//! Channels store their rate as ticks-per-sample against the firmware's
//! 1000 Hz tick clock; replies report it back in samples per second.

use crate::handlers::{to_object, CommandHandler, Fragment};
use serde_json::{json, Value};

/// Firmware tick clock, in ticks per second.
const TICK_RATE_HZ: f64 = 1000.0;

/// Ticks per sample at the named sampling frequency.
const SAMPLE_10HZ: f64 = TICK_RATE_HZ / 10.0;
const SAMPLE_5HZ: f64 = TICK_RATE_HZ / 5.0;

/// Metadata for one logged channel.
struct ChannelConfig {
    label: &'static str,
    units: &'static str,
    min: f64,
    max: f64,
    /// Ticks per sample; zero means unsampled.
    sample_rate: f64,
    precision: u32,
}

impl ChannelConfig {
    fn new(label: &'static str) -> Self {
        ChannelConfig {
            label,
            units: "",
            min: 0.0,
            max: 0.0,
            sample_rate: 0.0,
            precision: 0,
        }
    }

    fn units(mut self, units: &'static str) -> Self {
        self.units = units;
        self
    }

    fn sample_rate(mut self, ticks_per_sample: f64) -> Self {
        self.sample_rate = ticks_per_sample;
        self
    }

    fn precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    fn as_json(&self) -> Value {
        // report samples per second; out-of-range rates read as unsampled
        let sr = if self.sample_rate > 0.0 && self.sample_rate < TICK_RATE_HZ {
            TICK_RATE_HZ / self.sample_rate
        } else {
            0.0
        };

        json!({
            "nm": self.label,
            "ut": self.units,
            "min": round_to(self.min, self.precision),
            "max": round_to(self.max, self.precision),
            "prec": self.precision,
            "sr": sr,
        })
    }
}

fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

pub struct LapConfigHandler {
    lap_count: ChannelConfig,
    lap_time: ChannelConfig,
    sector: ChannelConfig,
    sector_time: ChannelConfig,
    pred_time: ChannelConfig,
    elapsed_time: ChannelConfig,
    current_lap: ChannelConfig,
    distance: ChannelConfig,
    session_time: ChannelConfig,
}

impl LapConfigHandler {
    const LAP_STATS_RATE: f64 = SAMPLE_10HZ;

    pub fn new() -> Self {
        LapConfigHandler {
            lap_count: ChannelConfig::new("LapCount").sample_rate(Self::LAP_STATS_RATE),
            lap_time: ChannelConfig::new("LapTime")
                .units("Min")
                .sample_rate(Self::LAP_STATS_RATE)
                .precision(4),
            sector: ChannelConfig::new("Sector").sample_rate(Self::LAP_STATS_RATE),
            sector_time: ChannelConfig::new("SectorTime")
                .units("Min")
                .sample_rate(Self::LAP_STATS_RATE)
                .precision(4),
            pred_time: ChannelConfig::new("PredTime")
                .units("Min")
                .sample_rate(SAMPLE_5HZ)
                .precision(4),
            elapsed_time: ChannelConfig::new("ElapsedTime")
                .units("Min")
                .sample_rate(Self::LAP_STATS_RATE)
                .precision(4),
            current_lap: ChannelConfig::new("CurrentLap").sample_rate(Self::LAP_STATS_RATE),
            distance: ChannelConfig::new("Distance")
                .units("mi")
                .sample_rate(Self::LAP_STATS_RATE)
                .precision(4),
            session_time: ChannelConfig::new("SessionTime")
                .units("Min")
                .sample_rate(Self::LAP_STATS_RATE)
                .precision(4),
        }
    }
}

impl Default for LapConfigHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandHandler for LapConfigHandler {
    fn commands(&self) -> &'static [&'static str] {
        &["getLapCfg"]
    }

    fn execute(&mut self, command: &str, _query: &Value) -> Option<Fragment> {
        if command != "getLapCfg" {
            return None;
        }

        Some(to_object(json!({
            "lapCfg": {
                "lapCount": self.lap_count.as_json(),
                "lapTime": self.lap_time.as_json(),
                "predTime": self.pred_time.as_json(),
                "sector": self.sector.as_json(),
                "sectorTime": self.sector_time.as_json(),
                "elapsedTime": self.elapsed_time.as_json(),
                "currentLap": self.current_lap.as_json(),
                "dist": self.distance.as_json(),
                "sessionTime": self.session_time.as_json(),
            }
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sample_rate_derivation() {
        let channel = ChannelConfig::new("LapTime")
            .units("Min")
            .sample_rate(SAMPLE_10HZ)
            .precision(4);
        let json = channel.as_json();
        assert_eq!(json["nm"], "LapTime");
        assert_eq!(json["ut"], "Min");
        assert_eq!(json["prec"], 4);
        assert_eq!(json["sr"], 10.0);
    }

    #[test]
    fn test_unsampled_channel_reports_zero_rate() {
        let channel = ChannelConfig::new("Idle");
        assert_eq!(channel.as_json()["sr"], 0.0);

        let too_slow = ChannelConfig::new("Slow").sample_rate(TICK_RATE_HZ);
        assert_eq!(too_slow.as_json()["sr"], 0.0);
    }

    #[test]
    fn test_round_to_precision() {
        assert_eq!(round_to(1.23456, 4), 1.2346);
        assert_eq!(round_to(1.23456, 0), 1.0);
    }

    #[test]
    fn test_lap_config_fragment_shape() {
        let mut handler = LapConfigHandler::new();
        let fragment = handler.execute("getLapCfg", &Value::Null).unwrap();

        let cfg = fragment["lapCfg"].as_object().unwrap();
        for key in [
            "lapCount",
            "lapTime",
            "predTime",
            "sector",
            "sectorTime",
            "elapsedTime",
            "currentLap",
            "dist",
            "sessionTime",
        ] {
            assert!(cfg.contains_key(key), "missing channel {key}");
        }

        // lap stats sample at 10 Hz, predicted time at 5 Hz
        assert_eq!(cfg["lapTime"]["sr"], 10.0);
        assert_eq!(cfg["predTime"]["sr"], 5.0);
        assert_eq!(cfg["dist"]["ut"], "mi");
        assert_eq!(cfg["lapCount"]["prec"], 0);
    }

    #[test]
    fn test_foreign_command_declined() {
        let mut handler = LapConfigHandler::new();
        assert!(handler.execute("getVer", &Value::Null).is_none());
    }
}
