//! The consent store: persisted decision + change broadcast.

use crate::region::{indicates_consent_region, ViewerHints};
use crate::ConsentResult;
use adgate_store::{keys, KeyValueStore};
use adgate_types::{ConsentCategories, ConsentRecord, ConsentStatus};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Capacity of the change channel. Consent decisions are rare; a small
/// buffer only has to absorb subscribers that poll lazily.
const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// A change notification published after every persisted decision.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsentChange {
    /// Whether ad personalization is now permitted.
    pub granted: bool,
    /// Which operation produced the change: `"accept"`, `"reject"`,
    /// `"custom"` or `"reset"`.
    pub source: String,
    /// When the decision was made.
    pub timestamp: DateTime<Utc>,
    /// The category settings chosen, when the source carries them.
    pub settings: Option<ConsentCategories>,
}

/// Holds and persists the viewer's consent decision.
///
/// All mutation happens through explicit operations ([`Self::grant`],
/// [`Self::deny`], [`Self::save_custom`], [`Self::reset`]); reads never
/// mutate. Corrupt or missing stored values degrade to the first-visit
/// record rather than erroring — consent state must never take the
/// host page down.
pub struct ConsentStore {
    store: Arc<dyn KeyValueStore>,
    hints: ViewerHints,
    changes: broadcast::Sender<ConsentChange>,
}

impl ConsentStore {
    /// Creates a consent store over a persistence backend.
    pub fn new(store: Arc<dyn KeyValueStore>, hints: ViewerHints) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            store,
            hints,
            changes,
        }
    }

    /// Subscribes to change notifications. Notifications are not
    /// replayed; subscribe before mutating.
    pub fn subscribe(&self) -> broadcast::Receiver<ConsentChange> {
        self.changes.subscribe()
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Reads the persisted record, degrading to the first-visit record
    /// on missing or corrupt values.
    pub fn read(&self) -> ConsentRecord {
        let mut record = ConsentRecord::unset();

        record.known_consent_region = self.stored_flag(keys::IS_EEA_USER);

        let answered = self.stored_flag(keys::COOKIE_CONSENT);
        if !answered {
            return record;
        }

        record.status = match self.stored(keys::ADSENSE_CONSENT).as_deref() {
            Some("granted") => ConsentStatus::Granted,
            Some("denied") => ConsentStatus::Denied,
            Some(other) => {
                warn!("unrecognized stored consent status {:?}, treating as unset", other);
                return ConsentRecord {
                    known_consent_region: record.known_consent_region,
                    ..ConsentRecord::unset()
                };
            }
            None => return record,
        };

        record.timestamp = self.stored(keys::CONSENT_TIMESTAMP).and_then(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|e| warn!("corrupt consent timestamp {:?}: {}", raw, e))
                .ok()
        });

        record.categories = self
            .stored(keys::CONSENT_SETTINGS)
            .and_then(|raw| {
                serde_json::from_str(&raw)
                    .map_err(|e| warn!("corrupt consent settings {:?}: {}", raw, e))
                    .ok()
            })
            .unwrap_or_else(|| match record.status {
                ConsentStatus::Granted => ConsentCategories::all(),
                _ => ConsentCategories::none(),
            });

        record
    }

    /// Whether this viewer must grant consent before ads personalize.
    ///
    /// True if a prior session recorded the classification, or the
    /// timezone/language heuristic matches. Best-effort, never
    /// authoritative.
    pub fn requires_consent(&self) -> bool {
        if self.stored_flag(keys::IS_EEA_USER) {
            return true;
        }
        indicates_consent_region(&self.hints)
    }

    /// Whether a stored decision exists and is still inside the
    /// validity window. False signals the caller to re-prompt.
    pub fn is_consent_valid(&self) -> bool {
        self.read().is_valid_at(Utc::now())
    }

    // ── Mutations ────────────────────────────────────────────────

    /// Records a full grant (the banner's "accept all").
    pub fn grant(&self) -> ConsentResult<ConsentRecord> {
        self.persist_decision(ConsentCategories::all(), "accept")
    }

    /// Records a denial (the banner's "reject").
    pub fn deny(&self) -> ConsentResult<ConsentRecord> {
        self.persist_decision(ConsentCategories::none(), "reject")
    }

    /// Records a per-category selection (the banner's "save choices").
    pub fn save_custom(&self, categories: ConsentCategories) -> ConsentResult<ConsentRecord> {
        self.persist_decision(categories, "custom")
    }

    /// Removes every consent key. The next [`Self::read`] behaves as a
    /// first visit, including re-deriving the region classification.
    pub fn reset(&self) -> ConsentResult<()> {
        for key in keys::ALL {
            self.store.remove(key)?;
        }
        info!("consent state reset");
        let _ = self.changes.send(ConsentChange {
            granted: false,
            source: "reset".to_string(),
            timestamp: Utc::now(),
            settings: None,
        });
        Ok(())
    }

    fn persist_decision(
        &self,
        categories: ConsentCategories,
        source: &str,
    ) -> ConsentResult<ConsentRecord> {
        let now = Utc::now();
        // Ad personalization follows the marketing category alone.
        let granted = categories.marketing;

        let record = if granted {
            ConsentRecord::granted(categories, now)
        } else {
            ConsentRecord {
                categories,
                ..ConsentRecord::denied(now)
            }
        };

        self.store.set(keys::COOKIE_CONSENT, "true")?;
        self.store.set(
            keys::ADSENSE_CONSENT,
            if granted { "granted" } else { "denied" },
        )?;
        self.store
            .set(keys::CONSENT_TIMESTAMP, &now.to_rfc3339())?;
        self.store
            .set(keys::CONSENT_SETTINGS, &serde_json::to_string(&categories)?)?;
        // Cache the classification so future sessions skip the heuristic.
        self.store.set(keys::IS_EEA_USER, "true")?;

        info!(source, granted, "consent decision persisted");

        let receivers = self.changes.send(ConsentChange {
            granted,
            source: source.to_string(),
            timestamp: now,
            settings: Some(categories),
        });
        if receivers.is_err() {
            debug!("no consent-change subscribers");
        }

        Ok(record)
    }

    // ── Helpers ──────────────────────────────────────────────────

    fn stored(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("store read failed for {}: {}", key, e);
                None
            }
        }
    }

    fn stored_flag(&self, key: &str) -> bool {
        self.stored(key).as_deref() == Some("true")
    }
}
