use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoverError {
    #[error("publish failed: {0}")]
    Publish(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("store document corrupt: {0}")]
    StoreCorrupt(String),
    #[error("unknown cover: {0}")]
    UnknownCover(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing cover spec")]
    MissingSpec,
    #[error("missing command publisher")]
    MissingPublisher,
    #[error("missing position store")]
    MissingStore,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
