use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("transport unavailable: {0}")]
    Unavailable(String),
    #[error("store document is corrupt: {0}")]
    Corrupt(String),
    #[error("unsupported store version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("store key mismatch: found {found:?}, expected {expected:?}")]
    KeyMismatch { found: String, expected: String },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IoError>;
