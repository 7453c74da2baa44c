//! Consent store for adgate.
//!
//! Holds and persists the viewer's consent decision, classifies whether
//! the viewer requires explicit consent at all, and broadcasts changes
//! to subscribers. The slot initializer in `adgate-engine` reads this
//! store as a precondition on every evaluation.
//!
//! Durability is the key/value seam from `adgate-store`; the change
//! notification is an in-process broadcast channel. There is no forced
//! page reload here — subscribers are the single change mechanism.

mod region;
mod store;

pub use region::{indicates_consent_region, ViewerHints};
pub use store::{ConsentChange, ConsentStore};

/// Result type for consent operations.
pub type ConsentResult<T> = Result<T, ConsentError>;

/// Errors that can occur in consent operations.
#[derive(Debug, thiserror::Error)]
pub enum ConsentError {
    /// The underlying store failed.
    #[error("store error: {0}")]
    Store(#[from] adgate_store::StoreError),

    /// Serialization error for category settings.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
