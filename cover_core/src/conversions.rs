//! Conversions bridging `cover_config` types to `cover_core` types.

use std::time::Duration;

use crate::config::{ControllerCfg, CoverSpec};

impl From<&cover_config::ControllerCfg> for ControllerCfg {
    fn from(c: &cover_config::ControllerCfg) -> Self {
        Self {
            tick: Duration::from_millis(c.tick_ms),
            cancel_ack_timeout: Duration::from_millis(c.cancel_ack_timeout_ms),
            calibration_slack: Duration::from_millis(c.calibration_slack_ms),
            calibration_settle: Duration::from_millis(c.calibration_settle_ms),
        }
    }
}

impl CoverSpec {
    /// Build the spec for the cover stored under `key` in the config.
    pub fn from_config(key: &str, c: &cover_config::CoverCfg) -> Self {
        let id = c.resolved_id(key);
        Self {
            name: c.display_name(&id),
            id,
            opening_time: Duration::from_millis(c.opening_time),
            closing_time: Duration::from_millis(c.closing_time_ms()),
            command_topic: c.mqtt_command_topic.clone(),
            open_payload: c.mqtt_payload_open.clone(),
            close_payload: c.mqtt_payload_close.clone(),
            stop_payload: c.mqtt_payload_stop.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cover_spec_from_config_converts_ms_and_defaults() {
        let cfg = cover_config::load_toml(
            r#"
[covers.porch]
friendly_name = "Porch door"
opening_time = 8500
mqtt_command_topic = "porch/set"
mqtt_payload_open = "1"
mqtt_payload_close = "0"
mqtt_payload_stop = "S"
"#,
        )
        .expect("parse");
        let spec = CoverSpec::from_config("porch", &cfg.covers["porch"]);
        assert_eq!(spec.id, "porch");
        assert_eq!(spec.name, "Porch door");
        assert_eq!(spec.opening_time, Duration::from_millis(8500));
        assert_eq!(spec.closing_time, Duration::from_millis(8500));
        assert_eq!(spec.open_payload, "1");
        assert_eq!(spec.stop_payload, "S");
    }

    #[test]
    fn controller_cfg_from_defaults() {
        let core: ControllerCfg = (&cover_config::ControllerCfg::default()).into();
        assert_eq!(core.tick, Duration::from_millis(100));
        assert_eq!(core.calibration_slack, Duration::from_secs(1));
    }
}
