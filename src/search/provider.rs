//! The search capability the palette consumes.

use thiserror::Error;

use crate::model::types::{RawResults, SessionIdentity};

/// Errors surfaced by a search backend.
///
/// The palette never shows these to the user; a failed lookup renders the
/// same as an empty one.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("search backend unavailable: {0}")]
    Unavailable(String),

    #[error("search query failed: {0}")]
    Query(String),

    #[error("lookup worker disconnected")]
    Disconnected,
}

/// Read-only "global search" over the signed-in user's entities.
pub trait SearchProvider {
    /// Look up `term` across every category visible to `identity`.
    fn search(&self, term: &str, identity: &SessionIdentity) -> Result<RawResults, LookupError>;

    /// Monotonic marker that changes whenever the underlying data changes.
    ///
    /// Backends without change tracking return a constant, which disables
    /// live refresh.
    fn data_version(&self) -> Result<u64, LookupError> {
        Ok(0)
    }
}

impl<P: SearchProvider + ?Sized> SearchProvider for Box<P> {
    fn search(&self, term: &str, identity: &SessionIdentity) -> Result<RawResults, LookupError> {
        (**self).search(term, identity)
    }

    fn data_version(&self) -> Result<u64, LookupError> {
        (**self).data_version()
    }
}
