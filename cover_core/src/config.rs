//! Runtime configuration for covers.
//!
//! These are the construction parameters used by `Cover`. They are separate
//! from the TOML-deserialized config in `cover_config`.

use std::time::Duration;

/// Timing knobs shared by every cover of a controller.
#[derive(Debug, Clone)]
pub struct ControllerCfg {
    /// Sampling tick of the movement loop.
    pub tick: Duration,
    /// Upper bound on waiting for an interrupted movement to acknowledge.
    pub cancel_ack_timeout: Duration,
    /// Extra run time added to each calibration leg so the cover hits its limit.
    pub calibration_slack: Duration,
    /// Pause after each calibration STOP.
    pub calibration_settle: Duration,
}

impl Default for ControllerCfg {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(100),
            cancel_ack_timeout: Duration::from_secs(2),
            calibration_slack: Duration::from_secs(1),
            calibration_settle: Duration::from_secs(1),
        }
    }
}

/// Static description of one relay pair. Immutable after construction.
#[derive(Debug, Clone)]
pub struct CoverSpec {
    /// Persistence key.
    pub id: String,
    pub name: String,
    /// Full 0 -> 100 travel time.
    pub opening_time: Duration,
    /// Full 100 -> 0 travel time.
    pub closing_time: Duration,
    pub command_topic: String,
    pub open_payload: String,
    pub close_payload: String,
    pub stop_payload: String,
}

impl CoverSpec {
    /// Spec with the conventional OPEN/CLOSE/STOP payloads and symmetric
    /// travel time.
    pub fn new(id: impl Into<String>, topic: impl Into<String>, travel: Duration) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            opening_time: travel,
            closing_time: travel,
            command_topic: topic.into(),
            open_payload: "OPEN".to_string(),
            close_payload: "CLOSE".to_string(),
            stop_payload: "STOP".to_string(),
        }
    }

    pub fn with_closing_time(mut self, closing: Duration) -> Self {
        self.closing_time = closing;
        self
    }
}
