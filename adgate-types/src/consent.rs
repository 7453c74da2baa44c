//! Consent records and category settings.
//!
//! A [`ConsentRecord`] is the persisted form of the viewer's decision.
//! It is mutated only by explicit user action (or an explicit reset)
//! through the consent store, and read by the slot initializer on every
//! evaluation. Records survive reloads; validity decays after
//! [`CONSENT_VALIDITY_MONTHS`].

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

/// How long a recorded decision stays valid before the viewer must be
/// re-prompted. Thirteen months, per the usual regulatory guidance.
pub const CONSENT_VALIDITY_MONTHS: u32 = 13;

/// The viewer's decision, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentStatus {
    Granted,
    Denied,
    Unset,
}

/// Per-category consent flags. The "necessary" category is implicitly
/// always granted and not represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentCategories {
    pub analytics: bool,
    pub marketing: bool,
    pub personalization: bool,
}

impl ConsentCategories {
    /// Everything granted.
    #[must_use]
    pub fn all() -> Self {
        Self {
            analytics: true,
            marketing: true,
            personalization: true,
        }
    }

    /// Everything denied (only the implicit necessary category remains).
    #[must_use]
    pub fn none() -> Self {
        Self {
            analytics: false,
            marketing: false,
            personalization: false,
        }
    }
}

impl Default for ConsentCategories {
    fn default() -> Self {
        Self::none()
    }
}

/// The persisted consent decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsentRecord {
    /// The decision itself.
    pub status: ConsentStatus,
    /// When the decision was made; `None` until the viewer answers.
    pub timestamp: Option<DateTime<Utc>>,
    /// Per-category flags chosen by the viewer.
    pub categories: ConsentCategories,
    /// Whether a prior session already classified this viewer as
    /// belonging to a consent-requiring region. Cached so the heuristic
    /// is not re-derived after the viewer has answered.
    pub known_consent_region: bool,
}

impl ConsentRecord {
    /// The first-visit record: nothing decided, nothing cached.
    #[must_use]
    pub fn unset() -> Self {
        Self {
            status: ConsentStatus::Unset,
            timestamp: None,
            categories: ConsentCategories::none(),
            known_consent_region: false,
        }
    }

    /// Builds a granted record stamped `now` with the given categories.
    #[must_use]
    pub fn granted(categories: ConsentCategories, now: DateTime<Utc>) -> Self {
        Self {
            status: ConsentStatus::Granted,
            timestamp: Some(now),
            categories,
            known_consent_region: true,
        }
    }

    /// Builds a denied record stamped `now`.
    #[must_use]
    pub fn denied(now: DateTime<Utc>) -> Self {
        Self {
            status: ConsentStatus::Denied,
            timestamp: Some(now),
            categories: ConsentCategories::none(),
            known_consent_region: true,
        }
    }

    /// Whether the decision is still valid at `now`. Undecided records
    /// are never valid; decided records expire after
    /// [`CONSENT_VALIDITY_MONTHS`].
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if self.status == ConsentStatus::Unset {
            return false;
        }
        match self.timestamp {
            Some(ts) => match ts.checked_add_months(Months::new(CONSENT_VALIDITY_MONTHS)) {
                Some(expiry) => now < expiry,
                None => false,
            },
            None => false,
        }
    }

    /// Whether ad requests may be made for this viewer.
    ///
    /// Viewers outside consent-requiring regions are never gated. For
    /// viewers inside, an explicit grant with the marketing category is
    /// required: `marketing = false` means no ad requests.
    #[must_use]
    pub fn allows_ads(&self, requires_consent: bool) -> bool {
        if !requires_consent {
            return true;
        }
        self.status == ConsentStatus::Granted && self.categories.marketing
    }
}

impl Default for ConsentRecord {
    fn default() -> Self {
        Self::unset()
    }
}
