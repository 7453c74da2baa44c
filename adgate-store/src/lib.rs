//! Key/value persistence seam for adgate.
//!
//! The host environment owns real persistence (browser-style storage);
//! this crate defines the trait the rest of adgate codes against plus
//! two concrete backends:
//!
//! - [`MemoryStore`] — process-local map, for tests and embedding
//! - [`JsonFileStore`] — one JSON object on disk, written atomically
//!
//! Reads and writes are atomic point operations; there is no
//! transaction concept, matching the storage the seam stands in for.

mod error;
mod file;
mod memory;

pub use error::{StoreError, StoreResult};
pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// The exact key names consent state is persisted under. External
/// contract: values must round-trip losslessly under these names.
pub mod keys {
    /// `"true"` / `"false"` — whether the banner has been answered.
    pub const COOKIE_CONSENT: &str = "cookieConsent";
    /// `"granted"` / `"denied"` — the ad-personalization decision.
    pub const ADSENSE_CONSENT: &str = "adsense_consent";
    /// `"true"` when a prior session classified the viewer as
    /// belonging to a consent-requiring region; absent otherwise.
    pub const IS_EEA_USER: &str = "is_eea_user";
    /// ISO-8601 timestamp of the decision.
    pub const CONSENT_TIMESTAMP: &str = "consent_timestamp";
    /// Serialized per-category map.
    pub const CONSENT_SETTINGS: &str = "consent_settings";

    /// Every consent key, for reset.
    pub const ALL: [&str; 5] = [
        COOKIE_CONSENT,
        ADSENSE_CONSENT,
        IS_EEA_USER,
        CONSENT_TIMESTAMP,
        CONSENT_SETTINGS,
    ];
}

/// A string key/value store with atomic point reads and writes.
pub trait KeyValueStore: Send + Sync {
    /// Reads the value under `key`, `None` if absent.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Writes `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Removes `key` if present. Removing an absent key is a no-op.
    fn remove(&self, key: &str) -> StoreResult<()>;

    /// All keys currently present.
    fn keys(&self) -> StoreResult<Vec<String>>;
}
