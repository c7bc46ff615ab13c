#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for relay covers.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Each `[covers.<key>]` table describes one relay pair; the key doubles as
//!   the cover id unless `unique_id` overrides it.
//! - Travel times are given in milliseconds.
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use serde::Deserialize;

/// Display name prefix used when a cover has neither `name` nor `friendly_name`.
pub const DEFAULT_NAME: &str = "MQTT Relay Cover";
/// Key of the persisted position document.
pub const DEFAULT_STORE_KEY: &str = "mqtt_relay_cover";

#[derive(Debug, Deserialize, Clone)]
pub struct CoverCfg {
    /// Stable id used as the persistence key; defaults to the table key.
    pub unique_id: Option<String>,
    pub name: Option<String>,
    pub friendly_name: Option<String>,
    /// Full 0 -> 100 travel time (ms).
    pub opening_time: u64,
    /// Full 100 -> 0 travel time (ms); defaults to `opening_time`.
    pub closing_time: Option<u64>,
    pub mqtt_command_topic: String,
    pub mqtt_payload_open: String,
    pub mqtt_payload_close: String,
    pub mqtt_payload_stop: String,
}

impl CoverCfg {
    /// Effective id for the cover stored under `key`.
    pub fn resolved_id(&self, key: &str) -> String {
        self.unique_id.clone().unwrap_or_else(|| key.to_string())
    }

    /// Display name: `name`, then `friendly_name`, then the default prefix plus id.
    pub fn display_name(&self, id: &str) -> String {
        self.name
            .clone()
            .or_else(|| self.friendly_name.clone())
            .unwrap_or_else(|| format!("{DEFAULT_NAME} {id}"))
    }

    pub fn closing_time_ms(&self) -> u64 {
        self.closing_time.unwrap_or(self.opening_time)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ControllerCfg {
    /// Sampling tick of the movement loop (ms).
    pub tick_ms: u64,
    /// Upper bound on waiting for an interrupted movement to unwind (ms).
    pub cancel_ack_timeout_ms: u64,
    /// Extra run time added to each calibration leg (ms).
    pub calibration_slack_ms: u64,
    /// Pause after each calibration STOP (ms).
    pub calibration_settle_ms: u64,
}

impl Default for ControllerCfg {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            cancel_ack_timeout_ms: 2_000,
            calibration_slack_ms: 1_000,
            calibration_settle_ms: 1_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreCfg {
    /// JSON document holding the last known positions.
    pub path: PathBuf,
    /// Document key; lets several integrations share one directory.
    pub key: String,
}

impl Default for StoreCfg {
    fn default() -> Self {
        Self {
            path: PathBuf::from("var/relay_cover.json"),
            key: DEFAULT_STORE_KEY.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Log and record commands in-process.
    #[default]
    Sim,
    /// Append commands as JSON lines to a spool file for an external bridge.
    Spool,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct TransportCfg {
    pub kind: TransportKind,
    /// Required when `kind = "spool"`.
    pub spool_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub controller: ControllerCfg,
    #[serde(default)]
    pub store: StoreCfg,
    #[serde(default)]
    pub transport: TransportCfg,
    #[serde(default)]
    pub logging: Logging,
    /// Covers keyed by slug; ordered for stable iteration.
    #[serde(default)]
    pub covers: BTreeMap<String, CoverCfg>,
}

impl Config {
    /// Iterate covers as `(resolved_id, cfg)`.
    pub fn covers(&self) -> impl Iterator<Item = (String, &CoverCfg)> {
        self.covers.iter().map(|(k, c)| (c.resolved_id(k), c))
    }
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &std::path::Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {}: {}", path.display(), e))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("parse config {}: {}", path.display(), e))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Controller
        if self.controller.tick_ms == 0 {
            eyre::bail!("controller.tick_ms must be >= 1");
        }
        if self.controller.tick_ms > 10_000 {
            eyre::bail!("controller.tick_ms is unreasonably large (>10s)");
        }
        if self.controller.cancel_ack_timeout_ms == 0 {
            eyre::bail!("controller.cancel_ack_timeout_ms must be >= 1");
        }

        // Store
        if self.store.path.as_os_str().is_empty() {
            eyre::bail!("store.path must not be empty");
        }
        if self.store.key.trim().is_empty() {
            eyre::bail!("store.key must not be empty");
        }

        // Transport
        if self.transport.kind == TransportKind::Spool && self.transport.spool_path.is_none() {
            eyre::bail!("transport.spool_path is required when transport.kind = \"spool\"");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
        }

        // Covers
        if self.covers.is_empty() {
            eyre::bail!("at least one [covers.<id>] table is required");
        }
        let mut seen = HashSet::new();
        for (key, c) in &self.covers {
            if c.opening_time == 0 {
                eyre::bail!("covers.{key}.opening_time must be > 0");
            }
            if c.closing_time == Some(0) {
                eyre::bail!("covers.{key}.closing_time must be > 0");
            }
            if c.mqtt_command_topic.trim().is_empty() {
                eyre::bail!("covers.{key}.mqtt_command_topic must not be empty");
            }
            for (field, value) in [
                ("mqtt_payload_open", &c.mqtt_payload_open),
                ("mqtt_payload_close", &c.mqtt_payload_close),
                ("mqtt_payload_stop", &c.mqtt_payload_stop),
            ] {
                if value.is_empty() {
                    eyre::bail!("covers.{key}.{field} must not be empty");
                }
            }
            let id = c.resolved_id(key);
            if id.trim().is_empty() {
                eyre::bail!("covers.{key}.unique_id must not be empty");
            }
            if !seen.insert(id.clone()) {
                eyre::bail!("duplicate cover id {id:?} (covers.{key})");
            }
        }

        Ok(())
    }
}
