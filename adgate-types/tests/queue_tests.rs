use adgate_types::{QueueCall, SlotId, SlotPhase};

fn slot(id: &str) -> SlotId {
    SlotId::new(id).unwrap()
}

// ── QueueCall ─────────────────────────────────────────────────────

#[test]
fn slot_call_carries_identity() {
    let call = QueueCall::slot(slot("111"));
    assert_eq!(call.slot_id(), Some(&slot("111")));
    assert!(!call.is_page_level());
}

#[test]
fn page_level_call_has_no_slot_identity() {
    let call = QueueCall::page_level("ca-pub-123");
    assert!(call.is_page_level());
    assert_eq!(call.slot_id(), None);
}

#[test]
fn fetch_call_has_no_identity_at_all() {
    let call = QueueCall::Fetch {};
    assert!(!call.is_page_level());
    assert_eq!(call.slot_id(), None);
}

#[test]
fn calls_round_trip_through_json() {
    for call in [
        QueueCall::page_level("ca-pub-123"),
        QueueCall::slot(slot("42")),
        QueueCall::Fetch {},
    ] {
        let json = serde_json::to_string(&call).unwrap();
        let back: QueueCall = serde_json::from_str(&json).unwrap();
        assert_eq!(back, call);
    }
}

// ── SlotPhase transitions ─────────────────────────────────────────

#[test]
fn idle_enters_pending() {
    assert!(SlotPhase::Idle.can_enter(&SlotPhase::Pending { attempt: 1 }));
}

#[test]
fn pending_retries_must_increase_attempt() {
    let p1 = SlotPhase::Pending { attempt: 1 };
    assert!(p1.can_enter(&SlotPhase::Pending { attempt: 2 }));
    assert!(!p1.can_enter(&SlotPhase::Pending { attempt: 1 }));
    assert!(!p1.can_enter(&SlotPhase::Pending { attempt: 0 }));
}

#[test]
fn pending_resolves_to_loaded_or_failed() {
    let p = SlotPhase::Pending { attempt: 2 };
    assert!(p.can_enter(&SlotPhase::Loaded));
    assert!(p.can_enter(&SlotPhase::Failed));
}

#[test]
fn terminal_phases_admit_nothing() {
    for terminal in [SlotPhase::Loaded, SlotPhase::Failed] {
        assert!(terminal.is_terminal());
        assert!(!terminal.can_enter(&SlotPhase::Pending { attempt: 1 }));
        assert!(!terminal.can_enter(&SlotPhase::Idle));
    }
}

#[test]
fn idle_cannot_jump_to_terminal() {
    assert!(!SlotPhase::Idle.can_enter(&SlotPhase::Loaded));
    assert!(!SlotPhase::Idle.can_enter(&SlotPhase::Failed));
}
