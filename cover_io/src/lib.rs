#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Concrete collaborators for the cover controller: position stores and
//! command publishers.
pub mod atomic;
pub mod error;
pub mod publisher;
pub mod store;

pub use error::IoError;
pub use publisher::{PublishedCommand, SimulatedPublisher, SpoolPublisher};
pub use store::{JsonFileStore, MemoryStore, STORE_VERSION, StoreDocument};
