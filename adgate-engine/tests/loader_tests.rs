use adgate_engine::{
    AdsConfig, HostError, PageSession, PlaceholderSpec, RecordingQueue, ScriptHost, ScriptLoader,
    ScriptState,
};
use adgate_types::QueueCall;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Host double: counts injections and refreshes, with settable
/// script-presence and failure behavior.
#[derive(Default)]
struct FakeHost {
    script_present: AtomicBool,
    injection_fails: AtomicBool,
    injection_delay_ms: AtomicUsize,
    injections: AtomicUsize,
    refresh_fails: AtomicBool,
    refreshes: AtomicUsize,
}

#[async_trait]
impl ScriptHost for FakeHost {
    fn script_present(&self, _src: &str) -> bool {
        self.script_present.load(Ordering::SeqCst)
    }

    async fn inject_script(&self, _src: &str) -> Result<(), HostError> {
        self.injections.fetch_add(1, Ordering::SeqCst);
        let delay = self.injection_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }
        if self.injection_fails.load(Ordering::SeqCst) {
            Err(HostError::Script("network error".into()))
        } else {
            Ok(())
        }
    }

    fn mount_placeholder(&self, _spec: &PlaceholderSpec) -> Result<(), HostError> {
        Ok(())
    }

    async fn refresh_filled_slots(&self) -> Result<usize, HostError> {
        if self.refresh_fails.load(Ordering::SeqCst) {
            return Err(HostError::Refresh("no slots".into()));
        }
        Ok(self.refreshes.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

fn make_loader(config: AdsConfig) -> (Arc<FakeHost>, Arc<RecordingQueue>, ScriptLoader) {
    let host = Arc::new(FakeHost::default());
    let queue = Arc::new(RecordingQueue::new());
    let loader = ScriptLoader::new(
        Arc::new(config),
        Arc::new(PageSession::new()),
        host.clone(),
    );
    (host, queue, loader)
}

// ── Test mode ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_mode_installs_noop_queue_without_network() {
    let (host, production, loader) = make_loader(AdsConfig::new("ca-pub-1").test_mode());

    let state = loader.ensure_loaded(production.clone()).await;

    assert_eq!(state, ScriptState::TestMode);
    assert_eq!(host.injections.load(Ordering::SeqCst), 0);

    // Dependent pushes do not throw and never reach the real queue.
    let queue = loader.queue().expect("wrapper installed");
    let results = queue.push(&[QueueCall::Fetch {}]);
    assert!(results.iter().all(Result::is_ok));
    assert!(production.calls().is_empty());
}

// ── Injection paths ───────────────────────────────────────────────

#[tokio::test]
async fn successful_injection_loads_and_configures_page_level() {
    let (host, production, loader) = make_loader(AdsConfig::new("ca-pub-1"));

    let state = loader.ensure_loaded(production.clone()).await;

    assert_eq!(state, ScriptState::Loaded);
    assert_eq!(host.injections.load(Ordering::SeqCst), 1);
    // Page-level configuration goes out exactly once, on load.
    assert_eq!(production.page_level_count(), 1);
}

#[tokio::test]
async fn repeated_ensure_loaded_injects_once() {
    let (host, production, loader) = make_loader(AdsConfig::new("ca-pub-1"));

    loader.ensure_loaded(production.clone()).await;
    loader.ensure_loaded(production.clone()).await;
    loader.ensure_loaded(production.clone()).await;

    assert_eq!(host.injections.load(Ordering::SeqCst), 1);
    assert_eq!(production.page_level_count(), 1);
}

#[tokio::test]
async fn existing_script_tag_skips_injection() {
    let (host, production, loader) = make_loader(AdsConfig::new("ca-pub-1"));
    host.script_present.store(true, Ordering::SeqCst);

    let state = loader.ensure_loaded(production.clone()).await;

    assert_eq!(state, ScriptState::Loaded);
    assert_eq!(host.injections.load(Ordering::SeqCst), 0);
    assert_eq!(production.page_level_count(), 1);
}

#[tokio::test]
async fn failed_injection_degrades_to_noop_queue() {
    let (host, production, loader) = make_loader(AdsConfig::new("ca-pub-1"));
    host.injection_fails.store(true, Ordering::SeqCst);

    let state = loader.ensure_loaded(production.clone()).await;

    assert_eq!(state, ScriptState::Failed);
    // No retry of the script tag itself.
    let again = loader.ensure_loaded(production.clone()).await;
    assert_eq!(again, ScriptState::Failed);
    assert_eq!(host.injections.load(Ordering::SeqCst), 1);

    // Pushes degrade to the no-op fallback instead of throwing.
    let queue = loader.queue().expect("fallback wrapper installed");
    assert!(queue.push(&[QueueCall::Fetch {}]).iter().all(Result::is_ok));
    assert!(production.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn concurrent_ensure_loaded_races_inject_one_tag() {
    let (host, production, loader) = make_loader(AdsConfig::new("ca-pub-1"));
    host.injection_delay_ms.store(100, Ordering::SeqCst);

    let (first, second) = tokio::join!(
        loader.ensure_loaded(production.clone()),
        loader.ensure_loaded(production.clone()),
    );

    assert_eq!(host.injections.load(Ordering::SeqCst), 1);
    // One call owns the injection and resolves it; the other observes
    // the loading flag and backs off.
    assert!(matches!(
        (first, second),
        (ScriptState::Loaded, ScriptState::Loading) | (ScriptState::Loading, ScriptState::Loaded)
    ));
}

// ── Visibility refresh ────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn hidden_then_visible_refreshes_filled_slots() {
    let (host, production, loader) = make_loader(AdsConfig::new("ca-pub-1"));
    loader.ensure_loaded(production).await;

    loader.handle_visibility_change(false).await;
    loader.handle_visibility_change(true).await;

    assert_eq!(host.refreshes.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn visible_without_prior_hide_does_not_refresh() {
    let (host, production, loader) = make_loader(AdsConfig::new("ca-pub-1"));
    loader.ensure_loaded(production).await;

    loader.handle_visibility_change(true).await;

    assert_eq!(host.refreshes.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn no_refresh_before_script_is_loaded() {
    let (host, _production, loader) = make_loader(AdsConfig::new("ca-pub-1"));

    loader.handle_visibility_change(false).await;
    loader.handle_visibility_change(true).await;

    assert_eq!(host.refreshes.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn refresh_failures_are_swallowed() {
    let (host, production, loader) = make_loader(AdsConfig::new("ca-pub-1"));
    loader.ensure_loaded(production).await;
    host.refresh_fails.store(true, Ordering::SeqCst);

    loader.handle_visibility_change(false).await;
    // Must not panic or error; the refresh is maintenance only.
    loader.handle_visibility_change(true).await;
}
