//! Command publishers.
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use cover_traits::{BoxError, CommandPublisher};
use serde::Serialize;

use crate::error::IoError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedCommand {
    pub topic: String,
    pub payload: String,
}

/// Simulated transport: logs and records every command.
#[derive(Debug)]
pub struct SimulatedPublisher {
    available: AtomicBool,
    sent: Mutex<Vec<PublishedCommand>>,
}

impl Default for SimulatedPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedPublisher {
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Toggle availability to simulate a broker outage.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    pub fn commands(&self) -> Vec<PublishedCommand> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded commands carrying `payload`.
    pub fn count(&self, payload: &str) -> usize {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|c| c.payload == payload)
            .count()
    }
}

impl CommandPublisher for SimulatedPublisher {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    fn publish(&self, topic: &str, payload: &str) -> Result<(), BoxError> {
        if !self.is_available() {
            return Err(Box::new(IoError::Unavailable("simulated outage".into())));
        }
        tracing::info!(topic, payload, "publish (simulated)");
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(PublishedCommand {
                topic: topic.to_string(),
                payload: payload.to_string(),
            });
        Ok(())
    }
}

#[derive(Serialize)]
struct SpoolLine<'a> {
    topic: &'a str,
    payload: &'a str,
    ts_ms: u64,
}

/// Appends one JSON line per command to a spool file that an external
/// bridge forwards to the broker.
#[derive(Debug)]
pub struct SpoolPublisher {
    path: PathBuf,
    lock: Mutex<()>,
}

impl SpoolPublisher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn spool_dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }
}

impl CommandPublisher for SpoolPublisher {
    /// Available when the spool directory exists; the bridge owns it.
    fn is_available(&self) -> bool {
        self.spool_dir().is_dir()
    }

    fn publish(&self, topic: &str, payload: &str) -> Result<(), BoxError> {
        let ts_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let mut line = serde_json::to_vec(&SpoolLine {
            topic,
            payload,
            ts_ms,
        })
        .map_err(IoError::from)?;
        line.push(b'\n');

        let _g = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(IoError::from)?;
        file.write_all(&line).map_err(IoError::from)?;
        tracing::debug!(path = %self.path.display(), topic, payload, "spooled command");
        Ok(())
    }
}
