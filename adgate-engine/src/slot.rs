//! Slot initializer: the per-placement state machine.
//!
//! For one placement, decides eligibility (route, slot mapping,
//! consent, blocker probe), mounts the placeholder, and drives the
//! bounded-retry push attempt: `Idle -> Pending -> Loaded | Failed`,
//! with a `Pending -> Pending` self-loop while the external queue is
//! still absent. Nothing here ever panics the host page; every error
//! resolves to an outcome.

use crate::config::AdsConfig;
use crate::loader::{PlaceholderSpec, ScriptHost, ScriptLoader};
use crate::probe::BlockerProbe;
use crate::session::PageSession;
use adgate_consent::ConsentStore;
use adgate_types::{AdPlacement, AdPosition, ConsentStatus, QueueCall, SlotId, SlotPhase};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Why a placement rendered nothing at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The current route is in the excluded set.
    RouteExcluded,
    /// No network slot is mapped for the position.
    NoSlotMapping,
}

/// Terminal result of one placement evaluation.
///
/// The host chooses the presentation for each case; in particular a
/// caller-supplied fallback takes precedence over any default error
/// presentation for [`SlotOutcome::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotOutcome {
    /// Nothing rendered, no state entered.
    Skipped(SkipReason),
    /// The viewer must answer the consent banner first.
    ConsentPending,
    /// The viewer refused ad personalization.
    ConsentDenied,
    /// A content blocker is suppressing ad elements.
    BlockerDetected,
    /// Another placement is already driving this slot's request.
    InFlight,
    /// The request reached the external queue (now or earlier in this
    /// page load — remounts of an initialized slot are inert).
    Loaded,
    /// Retries exhausted or construction failed.
    Failed,
}

/// Evaluates and requests ad slots, one placement at a time.
pub struct SlotInitializer {
    config: Arc<AdsConfig>,
    session: Arc<PageSession>,
    consent: Arc<ConsentStore>,
    loader: Arc<ScriptLoader>,
    host: Arc<dyn ScriptHost>,
    probe: Arc<dyn BlockerProbe>,
}

impl SlotInitializer {
    /// Creates an initializer sharing the page session and loader.
    pub fn new(
        config: Arc<AdsConfig>,
        session: Arc<PageSession>,
        consent: Arc<ConsentStore>,
        loader: Arc<ScriptLoader>,
        host: Arc<dyn ScriptHost>,
        probe: Arc<dyn BlockerProbe>,
    ) -> Self {
        Self {
            config,
            session,
            consent,
            loader,
            host,
            probe,
        }
    }

    /// Evaluates a placement mount at `position` on `route`.
    ///
    /// Cancellation is the unmount signal: dropping the returned
    /// future cancels any pending backoff timer without touching the
    /// page-global dedup state.
    pub async fn initialize(&self, position: AdPosition, route: &str) -> SlotOutcome {
        // (a) Route exclusion: render nothing, enter no state.
        if self.config.excluded_routes.is_excluded(route) {
            debug!(route, %position, "route excluded, no placement");
            return SlotOutcome::Skipped(SkipReason::RouteExcluded);
        }

        // (b) Slot mapping.
        let Some(slot_id) = self.config.slot_for(position).cloned() else {
            warn!(%position, "no slot id mapped for position");
            return SlotOutcome::Skipped(SkipReason::NoSlotMapping);
        };

        // (c) Consent gate.
        if let Some(outcome) = self.consent_outcome() {
            debug!(%position, ?outcome, "consent gate closed");
            return outcome;
        }

        // (d) Blocker probe.
        if self.probe.detect().await {
            info!(%position, "ad blocker detected, not requesting");
            return SlotOutcome::BlockerDetected;
        }

        // Idempotence: a slot already pushed this page load stays inert.
        if self.session.slot_seen(&slot_id)
            || self.session.slot_phase(&slot_id) == SlotPhase::Loaded
        {
            debug!(slot = %slot_id, "slot already initialized, remount is inert");
            return SlotOutcome::Loaded;
        }

        match self.session.slot_phase(&slot_id) {
            SlotPhase::Pending { .. } => return SlotOutcome::InFlight,
            // A remount is an explicit retry trigger for a failed slot.
            SlotPhase::Failed => self.session.reset_slot(&slot_id),
            _ => {}
        }

        self.request_slot(position, slot_id).await
    }

    /// Consent-change trigger: re-evaluates from the consent gate.
    /// Loaded slots stay loaded; anything else restarts cleanly.
    pub async fn on_consent_change(&self, position: AdPosition, route: &str) -> SlotOutcome {
        if let Some(slot_id) = self.config.slot_for(position) {
            self.session.reset_slot(slot_id);
        }
        debug!(%position, "re-evaluating placement after consent change");
        self.initialize(position, route).await
    }

    /// Route-change trigger: re-evaluates the exclusion check against
    /// the new route.
    pub async fn on_route_change(&self, position: AdPosition, route: &str) -> SlotOutcome {
        if let Some(slot_id) = self.config.slot_for(position) {
            self.session.reset_slot(slot_id);
        }
        self.initialize(position, route).await
    }

    /// Unmount signal. Clears the slot's phase tracking unless the
    /// request already went out; the page-global seen-slots set is
    /// deliberately untouched, so a remount cannot re-request a slot
    /// the library already received.
    pub fn on_unmount(&self, position: AdPosition) {
        if let Some(slot_id) = self.config.slot_for(position) {
            self.session.reset_slot(slot_id);
        }
    }

    /// Consent precondition, or `None` when ads may be requested.
    fn consent_outcome(&self) -> Option<SlotOutcome> {
        if !self.consent.requires_consent() {
            return None;
        }
        let record = self.consent.read();
        match record.status {
            ConsentStatus::Unset => Some(SlotOutcome::ConsentPending),
            ConsentStatus::Denied => Some(SlotOutcome::ConsentDenied),
            ConsentStatus::Granted => {
                if !record.categories.marketing {
                    // Granted without marketing is a refusal for ads.
                    Some(SlotOutcome::ConsentDenied)
                } else if !record.is_valid_at(Utc::now()) {
                    // Expired decision: re-prompt before requesting.
                    Some(SlotOutcome::ConsentPending)
                } else {
                    None
                }
            }
        }
    }

    /// Mounts the placeholder and drives the bounded-retry push.
    async fn request_slot(&self, position: AdPosition, slot_id: SlotId) -> SlotOutcome {
        let placement = AdPlacement::for_position(position, slot_id.clone());
        let spec = PlaceholderSpec::from_placement(&placement, &self.config.client_id);

        if self
            .session
            .transition_slot(&slot_id, SlotPhase::Pending { attempt: 0 })
            .is_err()
        {
            // Lost a race with another placement for the same slot.
            return SlotOutcome::InFlight;
        }

        if let Err(e) = self.host.mount_placeholder(&spec) {
            warn!(slot = %slot_id, "placeholder mount failed: {}", e);
            return self.fail(&slot_id);
        }

        let max = self.config.retry.max_attempts;
        for attempt in 1..=max {
            if self
                .session
                .transition_slot(&slot_id, SlotPhase::Pending { attempt })
                .is_err()
            {
                return SlotOutcome::InFlight;
            }

            if let Some(queue) = self.loader.queue() {
                if queue.is_available() {
                    return self.push_once(&slot_id, &queue);
                }
            }

            // Transient absence of the external queue: linear backoff,
            // attempt index times the unit.
            if attempt < max {
                debug!(slot = %slot_id, attempt, "queue unavailable, backing off");
                tokio::time::sleep(self.config.retry.unit * u32::from(attempt)).await;
            }
        }

        warn!(slot = %slot_id, attempts = max, "retries exhausted, slot failed");
        self.fail(&slot_id)
    }

    fn push_once(&self, slot_id: &SlotId, queue: &crate::queue::DedupQueue) -> SlotOutcome {
        let results = queue.push(&[QueueCall::slot(slot_id.clone())]);
        match results.first() {
            // Suppressed by dedup: some other path already requested it.
            None => {
                debug!(slot = %slot_id, "request suppressed by dedup, treating as loaded");
                self.load(slot_id)
            }
            Some(Ok(())) => {
                info!(slot = %slot_id, "slot request forwarded");
                self.load(slot_id)
            }
            Some(Err(e)) => {
                warn!(slot = %slot_id, "slot request rejected: {}", e);
                self.fail(slot_id)
            }
        }
    }

    fn load(&self, slot_id: &SlotId) -> SlotOutcome {
        if let Err(e) = self.session.transition_slot(slot_id, SlotPhase::Loaded) {
            debug!("ignoring transition error on load: {}", e);
        }
        SlotOutcome::Loaded
    }

    fn fail(&self, slot_id: &SlotId) -> SlotOutcome {
        if let Err(e) = self.session.transition_slot(slot_id, SlotPhase::Failed) {
            debug!("ignoring transition error on fail: {}", e);
        }
        SlotOutcome::Failed
    }
}
