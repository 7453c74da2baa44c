//! Region classification heuristic.
//!
//! Decides whether a viewer plausibly falls under a consent-requiring
//! regime (EEA/UK) from browser-visible hints: the IANA timezone name
//! and the primary browser language. Best-effort by construction —
//! browsers disagree, users travel, VPNs lie. A positive result only
//! gates ads until the viewer answers; it is never authoritative.

use serde::{Deserialize, Serialize};

/// Browser-visible environment hints supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerHints {
    /// IANA timezone name, e.g. `"Europe/Berlin"`.
    pub timezone: String,
    /// BCP 47 language tag, e.g. `"de-DE"` or `"en-GB"`.
    pub language: String,
}

impl ViewerHints {
    /// Creates hints from a timezone and language pair.
    #[must_use]
    pub fn new(timezone: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            timezone: timezone.into(),
            language: language.into(),
        }
    }
}

/// Timezone name fragments indicating an EEA/UK location. The Atlantic
/// entries cover EEA islands that are not under `Europe/`.
const TIMEZONE_MARKERS: [&str; 5] = [
    "Europe/",
    "Atlantic/Azores",
    "Atlantic/Madeira",
    "Atlantic/Canary",
    "Atlantic/Reykjavik",
];

/// Primary language subtags of EEA member states (plus Icelandic and
/// Norwegian). English is handled separately: only the GB/IE regional
/// variants indicate the regime.
const LANGUAGE_MARKERS: [&str; 25] = [
    "bg", "cs", "da", "de", "el", "es", "et", "fi", "fr", "ga", "hr", "hu", "is", "it", "lt",
    "lv", "mt", "nl", "no", "pl", "pt", "ro", "sk", "sl", "sv",
];

/// Whether the hints suggest a consent-requiring region.
#[must_use]
pub fn indicates_consent_region(hints: &ViewerHints) -> bool {
    if TIMEZONE_MARKERS
        .iter()
        .any(|marker| hints.timezone.contains(marker))
    {
        return true;
    }

    let tag = hints.language.to_ascii_lowercase();
    let primary = tag.split('-').next().unwrap_or("");

    if primary == "en" {
        return tag == "en-gb" || tag == "en-ie";
    }

    LANGUAGE_MARKERS.contains(&primary)
}
