//! The external queue seam and the dedup wrapper over it.

use crate::session::PageSession;
use adgate_types::QueueCall;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, warn};

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Errors the external queue can report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueueError {
    /// The library's queue object does not exist yet.
    #[error("external queue unavailable")]
    Unavailable,

    /// The library rejected the call.
    #[error("call rejected: {0}")]
    Rejected(String),
}

/// The external ad library's append-only call queue.
///
/// Each enqueued call is one configuration object; the library drains
/// the queue asynchronously after its script has executed. We depend
/// on that draining contract but never control its timing.
pub trait AdQueue: Send + Sync {
    /// Whether the queue object exists and accepts calls.
    fn is_available(&self) -> bool {
        true
    }

    /// Appends one call to the queue.
    fn enqueue(&self, call: &QueueCall) -> QueueResult<()>;
}

/// Stand-in queue installed in test mode and after a permanent script
/// load failure: accepts every call and drops it, so dependent pushes
/// never throw.
#[derive(Debug, Default)]
pub struct NoopQueue;

impl AdQueue for NoopQueue {
    fn enqueue(&self, call: &QueueCall) -> QueueResult<()> {
        debug!(?call, "no-op queue swallowed call");
        Ok(())
    }
}

/// Test queue that records every call it receives.
///
/// Availability is toggleable to simulate the window before the
/// external script has executed, and individual slot ids can be set to
/// reject, to simulate library-side errors.
#[derive(Debug, Default)]
pub struct RecordingQueue {
    calls: Mutex<Vec<QueueCall>>,
    available: AtomicBool,
    rejected_slots: Mutex<HashSet<String>>,
}

impl RecordingQueue {
    /// Creates an available recording queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
            rejected_slots: Mutex::new(HashSet::new()),
        }
    }

    /// Creates a queue that reports unavailable until
    /// [`Self::set_available`] is called.
    #[must_use]
    pub fn unavailable() -> Self {
        let queue = Self::new();
        queue.available.store(false, Ordering::SeqCst);
        queue
    }

    /// Toggles availability.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Makes every call carrying this slot id fail.
    pub fn reject_slot(&self, slot_id: &str) {
        self.rejected_slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(slot_id.to_string());
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<QueueCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many recorded calls carry the given slot id.
    #[must_use]
    pub fn count_for_slot(&self, slot_id: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.slot_id().map(|s| s.as_str()) == Some(slot_id))
            .count()
    }

    /// How many recorded calls are page-level configuration.
    #[must_use]
    pub fn page_level_count(&self) -> usize {
        self.calls().iter().filter(|c| c.is_page_level()).count()
    }
}

impl AdQueue for RecordingQueue {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn enqueue(&self, call: &QueueCall) -> QueueResult<()> {
        if !self.is_available() {
            return Err(QueueError::Unavailable);
        }
        if let Some(slot) = call.slot_id() {
            let rejected = self
                .rejected_slots
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(slot.as_str());
            if rejected {
                return Err(QueueError::Rejected(format!("slot {slot} rejected")));
            }
        }
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call.clone());
        Ok(())
    }
}

/// Dedup wrapper over the external queue.
///
/// Processes the calls of one push in order. Page-level configuration
/// is forwarded at most once per page load; a call carrying a slot id
/// is forwarded at most once per slot id; a call with no identity (the
/// empty fetch trigger) is forwarded unconditionally. Unrecognized
/// shapes fail open — the wrapper cannot know the library's full
/// contract.
///
/// A forwarding error is caught, logged and recorded in the returned
/// results; it never stops the remaining calls of the batch.
pub struct DedupQueue {
    session: Arc<PageSession>,
    inner: Arc<dyn AdQueue>,
}

impl DedupQueue {
    /// Installs the wrapper over `inner`. Installation is idempotent
    /// per session: a second install is logged and returns a wrapper
    /// sharing the same dedup state.
    pub fn install(session: Arc<PageSession>, inner: Arc<dyn AdQueue>) -> Self {
        if !session.install_wrapper() {
            debug!("queue wrapper already installed for this page load");
        }
        Self { session, inner }
    }

    /// Whether the underlying queue accepts calls.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    /// Pushes a batch of calls, deduplicating before forwarding.
    ///
    /// Returns the outcomes of the forwarded calls only; suppressed
    /// entries contribute nothing.
    pub fn push(&self, calls: &[QueueCall]) -> Vec<QueueResult<()>> {
        let mut results = Vec::new();

        for call in calls {
            let forward = if call.is_page_level() {
                let first = self.session.try_mark_page_level();
                if !first {
                    debug!("page-level configuration already sent, skipping");
                }
                first
            } else if let Some(slot_id) = call.slot_id() {
                let first = self.session.try_mark_slot_seen(slot_id);
                if !first {
                    debug!(slot = %slot_id, "slot already requested, skipping");
                }
                first
            } else {
                // No identity to dedup on; the library locates
                // unrendered placeholders itself.
                true
            };

            if !forward {
                continue;
            }

            match self.inner.enqueue(call) {
                Ok(()) => results.push(Ok(())),
                Err(e) => {
                    warn!(?call, "queue call failed: {}", e);
                    results.push(Err(e));
                }
            }
        }

        results
    }
}
