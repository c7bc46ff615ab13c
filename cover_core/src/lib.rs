#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Movement controller for relay-driven covers (transport-agnostic).
//!
//! The relays accept only OPEN/CLOSE/STOP and report nothing back, so this
//! crate keeps a time-based position estimate per cover. All side effects go
//! through `cover_traits::CommandPublisher` and `cover_traits::PositionStore`.
//!
//! ## Architecture
//!
//! - **Controller**: `Cover` runs move-to-position, stop and calibration (`cover` module)
//! - **Interpolation**: elapsed time to percent of travel (`interpolate` module)
//! - **Cancellation**: per-request token with acknowledgement (`cancel` module)
//! - **Construction**: `CoverBuilder` for one cover, `CoverSet` for a whole config
//!
//! Positions are whole percents: 0 is closed, 100 is open.

pub mod builder;
pub mod cancel;
pub mod config;
pub mod conversions;
pub mod cover;
pub mod error;
pub mod interpolate;
pub mod mocks;
pub mod registry;
pub mod state;
pub mod store_error;

pub use builder::CoverBuilder;
pub use config::{ControllerCfg, CoverSpec};
pub use cover::Cover;
pub use error::{BuildError, CoverError, Result};
pub use registry::CoverSet;
pub use state::{CoverState, Direction, MoveOutcome, MoveReport};
