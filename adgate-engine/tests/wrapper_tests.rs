use adgate_engine::{DedupQueue, NoopQueue, PageSession, QueueError, RecordingQueue};
use adgate_types::{QueueCall, SlotId};
use proptest::prelude::*;
use std::sync::Arc;

fn slot_call(id: &str) -> QueueCall {
    QueueCall::slot(SlotId::new(id).unwrap())
}

fn make_wrapper() -> (Arc<RecordingQueue>, DedupQueue) {
    let inner = Arc::new(RecordingQueue::new());
    let wrapper = DedupQueue::install(Arc::new(PageSession::new()), inner.clone());
    (inner, wrapper)
}

// ── Slot dedup ────────────────────────────────────────────────────

#[test]
fn slot_is_forwarded_at_most_once() {
    let (inner, wrapper) = make_wrapper();

    let first = wrapper.push(&[slot_call("a")]);
    assert_eq!(first.len(), 1);
    assert!(first[0].is_ok());

    // Same slot again, same batch or later batches: suppressed.
    let second = wrapper.push(&[slot_call("a"), slot_call("a")]);
    assert!(second.is_empty());

    assert_eq!(inner.count_for_slot("a"), 1);
}

#[test]
fn distinct_slots_all_go_through() {
    let (inner, wrapper) = make_wrapper();
    wrapper.push(&[slot_call("a"), slot_call("b"), slot_call("c")]);
    assert_eq!(inner.calls().len(), 3);
}

#[test]
fn duplicate_within_one_batch_is_suppressed() {
    let (inner, wrapper) = make_wrapper();
    let results = wrapper.push(&[slot_call("a"), slot_call("a"), slot_call("b")]);
    // Two forwarded calls, one suppressed entry contributing nothing.
    assert_eq!(results.len(), 2);
    assert_eq!(inner.count_for_slot("a"), 1);
    assert_eq!(inner.count_for_slot("b"), 1);
}

// ── Page-level singleton ──────────────────────────────────────────

#[test]
fn page_level_config_is_forwarded_at_most_once() {
    let (inner, wrapper) = make_wrapper();
    wrapper.push(&[QueueCall::page_level("ca-pub-1")]);
    wrapper.push(&[QueueCall::page_level("ca-pub-1")]);
    wrapper.push(&[QueueCall::page_level("ca-pub-other")]);
    assert_eq!(inner.page_level_count(), 1);
}

// ── Fetch triggers ────────────────────────────────────────────────

#[test]
fn fetch_triggers_are_never_deduplicated() {
    let (inner, wrapper) = make_wrapper();
    wrapper.push(&[QueueCall::Fetch {}]);
    wrapper.push(&[QueueCall::Fetch {}, QueueCall::Fetch {}]);
    assert_eq!(inner.calls().len(), 3);
}

// ── Ordering & batch isolation ────────────────────────────────────

#[test]
fn calls_are_forwarded_in_supplied_order() {
    let (inner, wrapper) = make_wrapper();
    wrapper.push(&[
        QueueCall::page_level("ca-pub-1"),
        slot_call("a"),
        QueueCall::Fetch {},
        slot_call("b"),
    ]);
    let calls = inner.calls();
    assert!(calls[0].is_page_level());
    assert_eq!(calls[1].slot_id().unwrap().as_str(), "a");
    assert_eq!(calls[2], QueueCall::Fetch {});
    assert_eq!(calls[3].slot_id().unwrap().as_str(), "b");
}

#[test]
fn a_failing_call_does_not_stop_the_batch() {
    let (inner, wrapper) = make_wrapper();
    inner.reject_slot("bad");

    let results = wrapper.push(&[slot_call("good"), slot_call("bad"), QueueCall::Fetch {}]);

    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(QueueError::Rejected(_))));
    assert!(results[2].is_ok());
    assert_eq!(inner.count_for_slot("good"), 1);
    assert_eq!(inner.count_for_slot("bad"), 0);
}

// ── Installation ──────────────────────────────────────────────────

#[test]
fn reinstallation_shares_dedup_state() {
    let session = Arc::new(PageSession::new());
    let inner = Arc::new(RecordingQueue::new());

    let first = DedupQueue::install(session.clone(), inner.clone());
    first.push(&[slot_call("a")]);

    // A second install over the same session is a no-op wrapper-wise:
    // it must see the slot as already requested.
    let second = DedupQueue::install(session, inner.clone());
    assert!(second.push(&[slot_call("a")]).is_empty());
    assert_eq!(inner.count_for_slot("a"), 1);
}

#[test]
fn availability_passes_through() {
    let inner = Arc::new(RecordingQueue::unavailable());
    let wrapper = DedupQueue::install(Arc::new(PageSession::new()), inner.clone());
    assert!(!wrapper.is_available());
    inner.set_available(true);
    assert!(wrapper.is_available());

    let noop = DedupQueue::install(Arc::new(PageSession::new()), Arc::new(NoopQueue));
    assert!(noop.is_available());
}

#[test]
fn unavailable_queue_errors_surface_per_call() {
    let inner = Arc::new(RecordingQueue::unavailable());
    let wrapper = DedupQueue::install(Arc::new(PageSession::new()), inner);
    let results = wrapper.push(&[slot_call("a")]);
    assert_eq!(results, vec![Err(QueueError::Unavailable)]);
}

// ── Idempotence property ──────────────────────────────────────────

fn call_strategy() -> impl Strategy<Value = QueueCall> {
    prop_oneof![
        (0u8..5).prop_map(|n| slot_call(&format!("slot-{n}"))),
        Just(QueueCall::page_level("ca-pub-1")),
        Just(QueueCall::Fetch {}),
    ]
}

proptest! {
    /// For any call sequence, each slot id reaches the queue at most
    /// once, at most one page-level call goes through, and every
    /// fetch trigger is forwarded.
    #[test]
    fn dedup_holds_for_arbitrary_sequences(
        batches in prop::collection::vec(
            prop::collection::vec(call_strategy(), 0..6),
            0..8,
        )
    ) {
        let (inner, wrapper) = make_wrapper();
        let mut fetches_sent = 0usize;
        for batch in &batches {
            wrapper.push(batch);
            fetches_sent += batch
                .iter()
                .filter(|c| matches!(c, QueueCall::Fetch {}))
                .count();
        }

        let forwarded = inner.calls();
        for n in 0..5u8 {
            let id = format!("slot-{n}");
            prop_assert!(inner.count_for_slot(&id) <= 1);
        }
        prop_assert!(inner.page_level_count() <= 1);

        let fetches_forwarded = forwarded
            .iter()
            .filter(|c| matches!(c, QueueCall::Fetch {}))
            .count();
        prop_assert_eq!(fetches_forwarded, fetches_sent);
    }
}
