//! Test and helper mocks for cover_core.
//!
//! Both mocks are cheap to clone; clones share state, so a test can hand one
//! to the builder and keep another to inspect.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use cover_traits::{BoxError, CommandPublisher, PositionStore};

/// Publisher that records every payload it is asked to send.
#[derive(Debug, Clone)]
pub struct RecordingPublisher {
    available: Arc<AtomicBool>,
    failing: Arc<AtomicBool>,
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl Default for RecordingPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self {
            available: Arc::new(AtomicBool::new(true)),
            failing: Arc::new(AtomicBool::new(false)),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_available(&self, up: bool) {
        self.available.store(up, Ordering::SeqCst);
    }

    /// Make every publish return an error while still reporting available.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Payloads in send order.
    pub fn payloads(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn topics(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(t, _)| t.clone())
            .collect()
    }

    pub fn count(&self, payload: &str) -> usize {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, p)| p == payload)
            .count()
    }

    pub fn clear(&self) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl CommandPublisher for RecordingPublisher {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn publish(&self, topic: &str, payload: &str) -> Result<(), BoxError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Box::new(std::io::Error::other("broker rejected publish")));
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((topic.to_string(), payload.to_string()));
        Ok(())
    }
}

/// In-memory store that logs every save and can be told to fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingStore {
    positions: Arc<Mutex<HashMap<String, u8>>>,
    saves: Arc<Mutex<Vec<(String, u8)>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_position(self, id: &str, position: u8) -> Self {
        self.positions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), position);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Successful saves in order.
    pub fn saves(&self) -> Vec<(String, u8)> {
        self.saves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, id: &str) -> Option<u8> {
        self.positions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .copied()
    }
}

impl PositionStore for RecordingStore {
    fn load(&self, id: &str) -> Result<Option<u8>, BoxError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Box::new(std::io::Error::other("store offline")));
        }
        Ok(self.get(id))
    }

    fn save(&self, id: &str, position: u8) -> Result<(), BoxError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Box::new(std::io::Error::other("store offline")));
        }
        self.positions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), position);
        self.saves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id.to_string(), position));
        Ok(())
    }
}
