//! Maps `Box<dyn Error>` from the `PositionStore` boundary to typed `CoverError`.
//!
//! The traits in `cover_traits` use `Box<dyn Error + Send + Sync>`; this module
//! converts those to our typed error enum, with an optional feature-gated path
//! for `cover_io::IoError` downcasting.

use crate::error::CoverError;

/// Map a store-boundary error to a typed `CoverError`.
///
/// Attempts to downcast known backend error types first, then falls back
/// to string-based heuristics.
pub fn map_store_error(e: &(dyn std::error::Error + 'static)) -> CoverError {
    #[cfg(feature = "io-errors")]
    {
        use cover_io::IoError;
        if let Some(io) = e.downcast_ref::<IoError>() {
            return match io {
                IoError::Corrupt(_)
                | IoError::UnsupportedVersion { .. }
                | IoError::KeyMismatch { .. }
                | IoError::Json(_) => CoverError::StoreCorrupt(io.to_string()),
                other => CoverError::Store(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("corrupt") {
        CoverError::StoreCorrupt(s)
    } else {
        CoverError::Store(s)
    }
}
