//! Engine configuration.

use crate::routes::RouteExclusions;
use adgate_types::{AdPosition, SlotId};
use std::collections::HashMap;
use std::time::Duration;

/// Base URL of the external ad library script.
pub const DEFAULT_SCRIPT_BASE: &str =
    "https://pagead2.googlesyndication.com/pagead/js/adsbygoogle.js";

/// Environment classification supplied by the embedding host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Real script injection and a real queue.
    Production,
    /// No network activity; a no-op queue stands in for the library so
    /// dependent code never branches on environment.
    Test,
}

/// Bounded linear-backoff retry parameters for slot requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum push attempts before a slot is marked failed.
    pub max_attempts: u8,
    /// Backoff unit; attempt `n` waits `n * unit` before retrying.
    pub unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            unit: Duration::from_millis(500),
        }
    }
}

/// Configuration for one page's ad delivery.
#[derive(Debug, Clone)]
pub struct AdsConfig {
    /// Ad network account identifier, e.g. `"ca-pub-123..."`.
    pub client_id: String,
    /// Environment classification.
    pub environment: Environment,
    /// Network slot bound to each position. Positions without an entry
    /// render nothing.
    pub slots: HashMap<AdPosition, SlotId>,
    /// Routes on which no ads run at all.
    pub excluded_routes: RouteExclusions,
    /// Retry parameters for slot requests.
    pub retry: RetryPolicy,
    /// Quiet period after the page becomes visible again before filled
    /// slots are re-requested.
    pub visibility_quiet_period: Duration,
}

impl AdsConfig {
    /// Creates a production configuration for an account. Policy pages
    /// are excluded and the retry policy is the default.
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            environment: Environment::Production,
            slots: HashMap::new(),
            excluded_routes: RouteExclusions::policy_pages(),
            retry: RetryPolicy::default(),
            visibility_quiet_period: Duration::from_secs(2),
        }
    }

    /// Switches the configuration into test mode.
    #[must_use]
    pub fn test_mode(mut self) -> Self {
        self.environment = Environment::Test;
        self
    }

    /// Binds a slot to a position.
    #[must_use]
    pub fn with_slot(mut self, position: AdPosition, slot_id: SlotId) -> Self {
        self.slots.insert(position, slot_id);
        self
    }

    /// Replaces the excluded-route list.
    #[must_use]
    pub fn with_excluded_routes(mut self, routes: RouteExclusions) -> Self {
        self.excluded_routes = routes;
        self
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The slot bound to a position, if any.
    #[must_use]
    pub fn slot_for(&self, position: AdPosition) -> Option<&SlotId> {
        self.slots.get(&position)
    }

    /// Full script URL including the account parameter.
    #[must_use]
    pub fn script_src(&self) -> String {
        format!("{}?client={}", DEFAULT_SCRIPT_BASE, self.client_id)
    }
}
