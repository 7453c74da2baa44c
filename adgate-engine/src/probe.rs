//! Ad-blocker detection seam.
//!
//! The real probe injects an invisible element styled with a class
//! name content blockers are known to hide, waits briefly, and treats
//! a zero rendered size as "blocked". That is a convention-based
//! heuristic with no guaranteed API, so it lives host-side behind this
//! trait.

use async_trait::async_trait;

/// Detects whether a content blocker is suppressing ad elements.
#[async_trait]
pub trait BlockerProbe: Send + Sync {
    /// Returns true when a blocker appears active. Must not error;
    /// a probe that cannot measure should answer false.
    async fn detect(&self) -> bool;
}

/// Probe that never reports a blocker. The default for hosts that do
/// not implement measurement.
#[derive(Debug, Default)]
pub struct NoProbe;

#[async_trait]
impl BlockerProbe for NoProbe {
    async fn detect(&self) -> bool {
        false
    }
}

/// Probe with a fixed answer, for tests.
#[derive(Debug)]
pub struct FixedProbe(pub bool);

#[async_trait]
impl BlockerProbe for FixedProbe {
    async fn detect(&self) -> bool {
        self.0
    }
}
