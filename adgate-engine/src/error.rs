//! Error types for the engine.

use adgate_types::{SlotId, SlotPhase};
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur in engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A slot phase transition violated the state machine.
    #[error("invalid transition for slot {slot}: {from:?} -> {to:?}")]
    InvalidTransition {
        slot: SlotId,
        from: SlotPhase,
        to: SlotPhase,
    },

    /// The host environment failed.
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Errors reported by the host environment seam.
#[derive(Debug, Error)]
pub enum HostError {
    /// The external script element failed to load.
    #[error("script load failed: {0}")]
    Script(String),

    /// Building or attaching the placeholder element failed.
    #[error("placeholder mount failed: {0}")]
    Mount(String),

    /// Re-requesting filled slots failed.
    #[error("slot refresh failed: {0}")]
    Refresh(String),
}
