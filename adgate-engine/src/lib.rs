//! Ad delivery engine for adgate.
//!
//! Three cooperating pieces, all scoped to one page load:
//!
//! - [`ScriptLoader`] — injects the external ad library script exactly
//!   once, installs the dedup wrapper over its call queue, and falls
//!   back to a no-op queue in test mode or on load failure.
//! - [`DedupQueue`] — intercepts every call headed for the external
//!   queue and suppresses duplicate slot requests and duplicate
//!   page-level configuration before they reach it.
//! - [`SlotInitializer`] — per placement, gates on route exclusion,
//!   consent and the ad-blocker probe, then drives the bounded-retry
//!   request state machine.
//!
//! The host environment (DOM, script tags, the real queue) sits behind
//! the [`ScriptHost`], [`AdQueue`] and [`BlockerProbe`] seams, and all
//! page-load-scoped flags live in an explicit [`PageSession`] so the
//! dedup logic is testable without a real page.

mod config;
mod error;
mod loader;
mod probe;
mod queue;
mod routes;
mod session;
mod slot;

pub use config::{AdsConfig, Environment, RetryPolicy};
pub use error::{EngineError, EngineResult, HostError};
pub use loader::{PlaceholderSpec, ScriptHost, ScriptLoader};
pub use probe::{BlockerProbe, FixedProbe, NoProbe};
pub use queue::{AdQueue, DedupQueue, NoopQueue, QueueError, QueueResult, RecordingQueue};
pub use routes::RouteExclusions;
pub use session::{PageSession, ScriptState};
pub use slot::{SkipReason, SlotInitializer, SlotOutcome};
