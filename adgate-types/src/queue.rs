//! Queue calls — the configuration objects pushed at the external ad
//! library — and per-slot lifecycle phases.
//!
//! The external library drains its call queue asynchronously after its
//! script has executed; each drained entry is one of these shapes. The
//! dedup wrapper in `adgate-engine` inspects calls through the
//! accessors here and never assumes more about the library's contract
//! than these three shapes.

use crate::SlotId;
use serde::{Deserialize, Serialize};

/// One configuration object destined for the external ad library's
/// call queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "kebab-case")]
pub enum QueueCall {
    /// One-time, whole-page configuration: identifies the account and
    /// enables automatic placement. Forwarded at most once per page
    /// load.
    PageLevel {
        client_id: String,
        enable_page_level_ads: bool,
    },

    /// Request to fill one specific slot. Forwarded at most once per
    /// slot id per page load.
    Slot { slot_id: SlotId },

    /// The empty trigger object: asks the library to fill the next
    /// unrendered placeholder it can find. Carries no identity, so it
    /// is never deduplicated.
    Fetch {},
}

impl QueueCall {
    /// Builds a page-level configuration call for an account.
    #[must_use]
    pub fn page_level(client_id: impl Into<String>) -> Self {
        QueueCall::PageLevel {
            client_id: client_id.into(),
            enable_page_level_ads: true,
        }
    }

    /// Builds a per-slot request call.
    #[must_use]
    pub fn slot(slot_id: SlotId) -> Self {
        QueueCall::Slot { slot_id }
    }

    /// The slot identity this call carries, if any.
    #[must_use]
    pub fn slot_id(&self) -> Option<&SlotId> {
        match self {
            QueueCall::Slot { slot_id } => Some(slot_id),
            _ => None,
        }
    }

    /// Whether this call is page-level configuration.
    #[must_use]
    pub fn is_page_level(&self) -> bool {
        matches!(self, QueueCall::PageLevel { .. })
    }
}

/// Lifecycle phase of one slot within a page load.
///
/// Valid transitions: `Idle → Pending`, `Pending → Pending` (bounded
/// retry), `Pending → Loaded`, `Pending → Failed`. `Loaded` and
/// `Failed` are terminal for the page load; only a consent change or a
/// remount restarts evaluation, and a `Loaded` slot stays inert even
/// then.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "kebab-case")]
pub enum SlotPhase {
    /// Not yet evaluated.
    Idle,
    /// Request in flight or awaiting a retry; `attempt` counts pushes
    /// tried so far.
    Pending { attempt: u8 },
    /// The request reached the external queue.
    Loaded,
    /// Retries exhausted or construction failed.
    Failed,
}

impl SlotPhase {
    /// Whether `next` is a legal successor of `self`.
    #[must_use]
    pub fn can_enter(&self, next: &SlotPhase) -> bool {
        match (self, next) {
            (SlotPhase::Idle, SlotPhase::Pending { .. }) => true,
            (SlotPhase::Pending { attempt: a }, SlotPhase::Pending { attempt: b }) => b > a,
            (SlotPhase::Pending { .. }, SlotPhase::Loaded) => true,
            (SlotPhase::Pending { .. }, SlotPhase::Failed) => true,
            _ => false,
        }
    }

    /// Whether this phase is terminal for the page load.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, SlotPhase::Loaded | SlotPhase::Failed)
    }
}

impl Default for SlotPhase {
    fn default() -> Self {
        SlotPhase::Idle
    }
}
