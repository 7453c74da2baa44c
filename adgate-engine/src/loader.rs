//! Script loader: one external script tag per page load, wrapper
//! installation, no-op fallbacks and the visibility refresh.

use crate::config::{AdsConfig, Environment};
use crate::queue::{AdQueue, DedupQueue, NoopQueue};
use crate::session::{PageSession, ScriptState};
use crate::HostError;
use adgate_types::{AdFormat, AdPlacement, AdPosition, QueueCall, SlotId};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Everything the host needs to build one ad placeholder element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceholderSpec {
    pub slot_id: SlotId,
    pub position: AdPosition,
    pub format: AdFormat,
    pub responsive: bool,
    pub layout_key: Option<String>,
    pub client_id: String,
}

impl PlaceholderSpec {
    /// Builds the spec for a placement under an account.
    #[must_use]
    pub fn from_placement(placement: &AdPlacement, client_id: impl Into<String>) -> Self {
        Self {
            slot_id: placement.slot_id.clone(),
            position: placement.position,
            layout_key: placement.layout_key().map(str::to_string),
            format: placement.format.clone(),
            responsive: placement.responsive,
            client_id: client_id.into(),
        }
    }
}

/// The host page environment: script tags, placeholder elements and
/// filled-slot refresh.
#[async_trait]
pub trait ScriptHost: Send + Sync {
    /// Whether a script element with this source already exists.
    fn script_present(&self, src: &str) -> bool;

    /// Creates and attaches the script element, resolving when its
    /// load or error event fires.
    async fn inject_script(&self, src: &str) -> Result<(), HostError>;

    /// Builds the placeholder element for a slot and attaches it to
    /// the placement's mount point.
    fn mount_placeholder(&self, spec: &PlaceholderSpec) -> Result<(), HostError>;

    /// Issues an explicit refresh for every currently-filled slot in
    /// the document. Returns how many slots were refreshed.
    async fn refresh_filled_slots(&self) -> Result<usize, HostError>;
}

/// Ensures the external ad library is loaded exactly once per page
/// load and hands out the wrapped queue.
///
/// The wrapped queue stays `None` until loading resolves one way or
/// the other; slot initializers treat that absence as transient and
/// retry with backoff.
pub struct ScriptLoader {
    config: Arc<AdsConfig>,
    session: Arc<PageSession>,
    host: Arc<dyn ScriptHost>,
    queue: Mutex<Option<Arc<DedupQueue>>>,
    hidden: AtomicBool,
}

impl ScriptLoader {
    /// Creates a loader for one page load.
    pub fn new(config: Arc<AdsConfig>, session: Arc<PageSession>, host: Arc<dyn ScriptHost>) -> Self {
        Self {
            config,
            session,
            host,
            queue: Mutex::new(None),
            hidden: AtomicBool::new(false),
        }
    }

    /// The wrapped queue, once installed.
    #[must_use]
    pub fn queue(&self) -> Option<Arc<DedupQueue>> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn install(&self, inner: Arc<dyn AdQueue>) -> Arc<DedupQueue> {
        let mut slot = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = slot.as_ref() {
            return existing.clone();
        }
        let wrapped = Arc::new(DedupQueue::install(self.session.clone(), inner));
        *slot = Some(wrapped.clone());
        wrapped
    }

    /// Sends the one-time page-level configuration. The wrapper makes
    /// this a singleton regardless of how often the loader runs.
    fn send_page_level(&self, queue: &DedupQueue) {
        for result in queue.push(&[QueueCall::page_level(&self.config.client_id)]) {
            if let Err(e) = result {
                warn!("page-level configuration push failed: {}", e);
            }
        }
    }

    /// Ensures the script is loaded (or definitively not loaded) and
    /// the queue wrapper installed. Safe to call from every placement;
    /// only the first call in a page load does work.
    ///
    /// Returns the script state reached by this call.
    pub async fn ensure_loaded(&self, production_queue: Arc<dyn AdQueue>) -> ScriptState {
        if self.config.environment == Environment::Test {
            self.session.mark_test_mode();
            self.install(Arc::new(NoopQueue));
            info!("test environment: no-op ad queue installed, no network activity");
            return ScriptState::TestMode;
        }

        let src = self.config.script_src();

        match self.session.script_state() {
            ScriptState::Loaded | ScriptState::TestMode => {
                let queue = self.install(production_queue);
                self.send_page_level(&queue);
                return self.session.script_state();
            }
            ScriptState::Failed => {
                self.install(Arc::new(NoopQueue));
                return ScriptState::Failed;
            }
            ScriptState::Loading => {
                // Another invocation owns the injection; its outcome
                // will install the wrapper.
                return ScriptState::Loading;
            }
            ScriptState::Unloaded => {}
        }

        // A matching tag left by a previous embed counts as loaded.
        if self.host.script_present(&src) {
            debug!("ad library script tag already present, skipping injection");
            self.session.mark_script_loaded();
            let queue = self.install(production_queue);
            self.send_page_level(&queue);
            return ScriptState::Loaded;
        }

        // Claim the loading flag before attachment so a second loader
        // invocation in the same page load cannot inject a second tag.
        if !self.session.begin_script_load() {
            return self.session.script_state();
        }

        match self.host.inject_script(&src).await {
            Ok(()) => {
                self.session.mark_script_loaded();
                let queue = self.install(production_queue);
                info!("ad library script loaded");
                self.send_page_level(&queue);
                ScriptState::Loaded
            }
            Err(e) => {
                // No retry of the tag itself; degrade to a no-op queue
                // so dependent pushes stay inert for this page load.
                warn!("ad library script failed to load: {}", e);
                self.session.mark_script_failed();
                self.install(Arc::new(NoopQueue));
                ScriptState::Failed
            }
        }
    }

    /// Reacts to a document visibility change. On the transition back
    /// to visible, waits the configured quiet period and re-requests
    /// every currently-filled slot. Maintenance only: every failure is
    /// swallowed.
    pub async fn handle_visibility_change(&self, visible: bool) {
        if !visible {
            self.hidden.store(true, Ordering::SeqCst);
            return;
        }

        let was_hidden = self.hidden.swap(false, Ordering::SeqCst);
        if !was_hidden {
            return;
        }

        if self.session.script_state() != ScriptState::Loaded {
            return;
        }

        tokio::time::sleep(self.config.visibility_quiet_period).await;

        match self.host.refresh_filled_slots().await {
            Ok(count) => debug!(count, "refreshed filled slots after visibility change"),
            Err(e) => warn!("slot refresh after visibility change failed: {}", e),
        }
    }
}
