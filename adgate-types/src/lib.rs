//! Core type definitions for adgate.
//!
//! This crate defines the fundamental, host-agnostic types used throughout
//! the ad-delivery engine:
//! - Ad placements, positions, formats and slot identifiers
//! - Queue calls (the external ad library's configuration objects)
//! - Per-slot lifecycle phases
//! - Consent records and category settings
//!
//! Everything host-specific (DOM access, storage, timers) belongs in the
//! seam traits of `adgate-engine` and `adgate-store`, not here.

mod consent;
mod placement;
mod queue;

pub use consent::{ConsentCategories, ConsentRecord, ConsentStatus, CONSENT_VALIDITY_MONTHS};
pub use placement::{AdFormat, AdPlacement, AdPosition, SlotId};
pub use queue::{QueueCall, SlotPhase};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid slot id: {0}")]
    InvalidSlotId(String),

    #[error("unknown ad position: {0}")]
    UnknownPosition(String),
}
