//! Page-session context: the page-load-scoped flags shared by the
//! loader, the dedup wrapper and the slot initializers.
//!
//! One [`PageSession`] corresponds to one page load. Its flags are
//! never reset by a placement unmounting — the external library must
//! not receive the same slot twice even if the UI element briefly
//! unmounts and remounts during a route transition. Only constructing
//! a fresh session (a new page load) clears them.

use crate::{EngineError, EngineResult};
use adgate_types::{SlotId, SlotPhase};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use tracing::debug;
use uuid::Uuid;

/// Lifecycle of the external library script within this page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptState {
    /// No injection attempted yet.
    Unloaded,
    /// A script element is attached and loading.
    Loading,
    /// The script executed; the real queue is live.
    Loaded,
    /// The script element failed; permanent for this page load.
    Failed,
    /// Test environment; the no-op queue is installed.
    TestMode,
}

#[derive(Debug)]
struct SessionInner {
    script: ScriptState,
    wrapper_installed: bool,
    page_level_configured: bool,
    seen_slots: HashSet<SlotId>,
    slot_phases: HashMap<SlotId, SlotPhase>,
}

/// Process-wide state for one page load.
///
/// Every check-and-record operation here takes one internal lock, so
/// dedup checks are atomic: no other caller can interleave between
/// "check seen" and "record seen".
#[derive(Debug)]
pub struct PageSession {
    id: Uuid,
    inner: Mutex<SessionInner>,
}

impl PageSession {
    /// Creates the session for a fresh page load.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            inner: Mutex::new(SessionInner {
                script: ScriptState::Unloaded,
                wrapper_installed: false,
                page_level_configured: false,
                seen_slots: HashSet::new(),
                slot_phases: HashMap::new(),
            }),
        }
    }

    /// The page-load identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Script lifecycle ─────────────────────────────────────────

    /// Current script state.
    #[must_use]
    pub fn script_state(&self) -> ScriptState {
        self.lock().script
    }

    /// Atomically claims the right to inject the script: transitions
    /// `Unloaded -> Loading` and returns true. Returns false when any
    /// other state is already set, so a second loader invocation in
    /// the same page load cannot inject a second tag.
    pub fn begin_script_load(&self) -> bool {
        let mut inner = self.lock();
        if inner.script == ScriptState::Unloaded {
            inner.script = ScriptState::Loading;
            true
        } else {
            false
        }
    }

    /// Marks the script loaded.
    pub fn mark_script_loaded(&self) {
        self.lock().script = ScriptState::Loaded;
    }

    /// Marks the script permanently failed for this page load.
    pub fn mark_script_failed(&self) {
        self.lock().script = ScriptState::Failed;
    }

    /// Marks the session as running in test mode.
    pub fn mark_test_mode(&self) {
        self.lock().script = ScriptState::TestMode;
    }

    // ── Wrapper installation ─────────────────────────────────────

    /// Marks the dedup wrapper installed. Returns false if it already
    /// was — re-installation is a no-op.
    pub fn install_wrapper(&self) -> bool {
        let mut inner = self.lock();
        if inner.wrapper_installed {
            false
        } else {
            inner.wrapper_installed = true;
            true
        }
    }

    /// Whether the wrapper has been installed.
    #[must_use]
    pub fn wrapper_installed(&self) -> bool {
        self.lock().wrapper_installed
    }

    // ── Dedup state ──────────────────────────────────────────────

    /// Atomically records the page-level configuration as sent.
    /// Returns true the first time, false ever after.
    pub fn try_mark_page_level(&self) -> bool {
        let mut inner = self.lock();
        if inner.page_level_configured {
            false
        } else {
            inner.page_level_configured = true;
            true
        }
    }

    /// Whether the page-level configuration was already sent.
    #[must_use]
    pub fn page_level_configured(&self) -> bool {
        self.lock().page_level_configured
    }

    /// Atomically records a slot as seen. Returns true the first time
    /// for that slot id, false ever after.
    pub fn try_mark_slot_seen(&self, slot_id: &SlotId) -> bool {
        self.lock().seen_slots.insert(slot_id.clone())
    }

    /// Whether a slot was already pushed to the queue.
    #[must_use]
    pub fn slot_seen(&self, slot_id: &SlotId) -> bool {
        self.lock().seen_slots.contains(slot_id)
    }

    // ── Slot phases ──────────────────────────────────────────────

    /// Current phase of a slot; `Idle` when never evaluated.
    #[must_use]
    pub fn slot_phase(&self, slot_id: &SlotId) -> SlotPhase {
        self.lock()
            .slot_phases
            .get(slot_id)
            .copied()
            .unwrap_or_default()
    }

    /// Transitions a slot to `next`, enforcing the state machine.
    pub fn transition_slot(&self, slot_id: &SlotId, next: SlotPhase) -> EngineResult<()> {
        let mut inner = self.lock();
        let current = inner
            .slot_phases
            .get(slot_id)
            .copied()
            .unwrap_or_default();
        if !current.can_enter(&next) {
            return Err(EngineError::InvalidTransition {
                slot: slot_id.clone(),
                from: current,
                to: next,
            });
        }
        debug!(slot = %slot_id, ?current, ?next, "slot transition");
        inner.slot_phases.insert(slot_id.clone(), next);
        Ok(())
    }

    /// Resets a slot to `Idle` for re-evaluation (consent change or
    /// remount). A `Loaded` slot stays loaded — the library already
    /// has its request.
    pub fn reset_slot(&self, slot_id: &SlotId) {
        let mut inner = self.lock();
        match inner.slot_phases.get(slot_id) {
            Some(SlotPhase::Loaded) => {}
            Some(_) => {
                inner.slot_phases.insert(slot_id.clone(), SlotPhase::Idle);
            }
            None => {}
        }
    }
}

impl Default for PageSession {
    fn default() -> Self {
        Self::new()
    }
}
