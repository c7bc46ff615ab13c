//! Trait seams between the cover controller and its collaborators.
//!
//! The controller never talks to a broker or a disk directly; it goes through
//! `CommandPublisher` and `PositionStore`, and measures time through `Clock`.
pub mod clock;

pub use clock::{Clock, MonotonicClock};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Outbound command channel to the relay actuator.
///
/// Payloads are opaque strings supplied by configuration.
pub trait CommandPublisher {
    /// Whether the transport can accept a publish right now.
    fn is_available(&self) -> bool;

    fn publish(&self, topic: &str, payload: &str) -> Result<(), BoxError>;
}

/// Durable mapping from cover id to the last known position (0..=100).
pub trait PositionStore {
    /// Load the persisted position for `id`, `None` when nothing was stored.
    fn load(&self, id: &str) -> Result<Option<u8>, BoxError>;

    /// Persist `position` for `id`, leaving other covers' entries untouched.
    fn save(&self, id: &str, position: u8) -> Result<(), BoxError>;
}
