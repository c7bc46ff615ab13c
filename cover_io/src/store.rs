//! Position persistence.
//!
//! One versioned JSON document holds every cover's last known position:
//!
//! ```json
//! { "version": 1, "key": "mqtt_relay_cover", "data": { "living_room": 37 } }
//! ```
//!
//! Saves update a single cover's entry and rewrite the document atomically.
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use cover_traits::{BoxError, PositionStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::atomic::write_atomic;
use crate::error::{IoError, Result};

pub const STORE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    pub version: u32,
    pub key: String,
    #[serde(default)]
    pub data: BTreeMap<String, Value>,
}

impl StoreDocument {
    pub fn empty(key: &str) -> Self {
        Self {
            version: STORE_VERSION,
            key: key.to_string(),
            data: BTreeMap::new(),
        }
    }

    /// Position stored for `id`. Fractional values written by older
    /// versions are rounded to the nearest percent.
    pub fn position(&self, id: &str) -> Result<Option<u8>> {
        let Some(v) = self.data.get(id) else {
            return Ok(None);
        };
        let raw = v
            .as_f64()
            .ok_or_else(|| IoError::Corrupt(format!("position for {id:?} is not a number: {v}")))?;
        let rounded = raw.round();
        if !(0.0..=100.0).contains(&rounded) {
            return Err(IoError::Corrupt(format!(
                "position for {id:?} out of range: {raw}"
            )));
        }
        Ok(Some(rounded as u8))
    }

    pub fn set_position(&mut self, id: &str, position: u8) {
        self.data.insert(id.to_string(), Value::from(position.min(100)));
    }
}

/// File-backed store; safe to share between covers of one process.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    key: String,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document; a missing file yields an empty document.
    pub fn read_document(&self) -> Result<StoreDocument> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(StoreDocument::empty(&self.key));
            }
            Err(e) => return Err(e.into()),
        };
        let doc: StoreDocument = serde_json::from_slice(&bytes)
            .map_err(|e| IoError::Corrupt(format!("{}: {e}", self.path.display())))?;
        if doc.version != STORE_VERSION {
            return Err(IoError::UnsupportedVersion {
                found: doc.version,
                expected: STORE_VERSION,
            });
        }
        if doc.key != self.key {
            return Err(IoError::KeyMismatch {
                found: doc.key,
                expected: self.key.clone(),
            });
        }
        Ok(doc)
    }

    fn write_document(&self, doc: &StoreDocument) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(doc)?;
        write_atomic(&self.path, &bytes)?;
        Ok(())
    }

    pub fn load_position(&self, id: &str) -> Result<Option<u8>> {
        let _g = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.read_document()?.position(id)
    }

    pub fn save_position(&self, id: &str, position: u8) -> Result<()> {
        let _g = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut doc = self.read_document()?;
        doc.set_position(id, position);
        self.write_document(&doc)?;
        tracing::debug!(path = %self.path.display(), cover = id, position, "position saved");
        Ok(())
    }
}

impl PositionStore for JsonFileStore {
    fn load(&self, id: &str) -> std::result::Result<Option<u8>, BoxError> {
        Ok(self.load_position(id)?)
    }

    fn save(&self, id: &str, position: u8) -> std::result::Result<(), BoxError> {
        Ok(self.save_position(id, position)?)
    }
}

/// In-memory store for simulation and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate an entry, as if persisted by an earlier run.
    pub fn with_position(self, id: &str, position: u8) -> Self {
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), position.min(100));
        self
    }

    pub fn get(&self, id: &str) -> Option<u8> {
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .copied()
    }
}

impl PositionStore for MemoryStore {
    fn load(&self, id: &str) -> std::result::Result<Option<u8>, BoxError> {
        Ok(self.get(id))
    }

    fn save(&self, id: &str, position: u8) -> std::result::Result<(), BoxError> {
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), position.min(100));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_rounds_fractional_positions() {
        let mut doc = StoreDocument::empty("k");
        doc.data.insert("a".into(), Value::from(36.6));
        assert_eq!(doc.position("a").expect("ok"), Some(37));
        assert_eq!(doc.position("missing").expect("ok"), None);
    }

    #[test]
    fn document_rejects_out_of_range_and_non_numbers() {
        let mut doc = StoreDocument::empty("k");
        doc.data.insert("hi".into(), Value::from(140));
        doc.data.insert("txt".into(), Value::from("open"));
        assert!(matches!(doc.position("hi"), Err(IoError::Corrupt(_))));
        assert!(matches!(doc.position("txt"), Err(IoError::Corrupt(_))));
    }

    #[test]
    fn memory_store_clamps_on_save() {
        let store = MemoryStore::new();
        store.save("a", 250).expect("save");
        assert_eq!(store.get("a"), Some(100));
    }
}
