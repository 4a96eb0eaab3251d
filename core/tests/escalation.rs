//! Escalation, update, resolve and notify on the ticket book.

use chrono::{DateTime, Utc};
use desk_core::{
    config::{EscalationPolicy, SlaThresholds},
    error::DeskError,
    selectors,
    ticket::{Priority, Ticket, TicketStatus},
    ticket_book::TicketBook,
};

fn ts(raw: &str) -> DateTime<Utc> {
    raw.parse().expect("valid RFC 3339")
}

fn ticket(id: &str, status: TicketStatus) -> Ticket {
    Ticket {
        id:               id.into(),
        title:            "WiFi Connection Issues".into(),
        description:      "Cannot connect from conference room B.".into(),
        user:             "Mike Chen".into(),
        category:         "Network".into(),
        priority:         Priority::Medium,
        status,
        created_at:       ts("2024-01-15T00:00:00Z"),
        sla_deadline:     ts("2024-01-16T00:00:00Z"),
        assigned_to:      "Jane Doe".into(),
        team:             "Network Team".into(),
        escalated:        false,
        escalation:       None,
        resolution_notes: None,
        updated_at:       None,
    }
}

fn book() -> TicketBook {
    TicketBook::from_tickets(vec![
        ticket("TKT-001", TicketStatus::Open),
        ticket("TKT-002", TicketStatus::InProgress),
        ticket("TKT-003", TicketStatus::Resolved),
    ])
    .unwrap()
}

const NOW: &str = "2024-01-15T20:00:00Z";

#[test]
fn escalate_sets_flag_status_and_record() {
    let mut book = book();
    let t = book
        .escalate(
            "TKT-001",
            2,
            "  Customer VIP  ",
            ts(NOW),
            &EscalationPolicy::default(),
            &SlaThresholds::default(),
        )
        .unwrap();

    assert!(t.escalated);
    assert_eq!(t.status, TicketStatus::Escalated);
    assert_eq!(t.updated_at, Some(ts(NOW)));
    let record = t.escalation.as_ref().unwrap();
    assert_eq!(record.level, 2);
    assert_eq!(record.reason, "Customer VIP");
    assert_eq!(record.escalated_at, ts(NOW));
}

/// Blank reasons are rejected and leave the ticket as it was.
#[test]
fn escalate_requires_a_reason() {
    let mut book = book();
    let before = book.get("TKT-001").unwrap().clone();

    for reason in ["", "   ", "\t\n"] {
        let err = book
            .escalate(
                "TKT-001",
                1,
                reason,
                ts(NOW),
                &EscalationPolicy::default(),
                &SlaThresholds::default(),
            )
            .unwrap_err();
        assert!(matches!(err, DeskError::Validation { field: "reason" }));
        assert!(err.is_rejection());
    }
    assert_eq!(book.get("TKT-001").unwrap(), &before);
}

#[test]
fn escalate_rejects_out_of_range_level() {
    let mut book = book();
    let policy = EscalationPolicy::default();
    for level in [0, policy.max_level + 1] {
        let err = book
            .escalate("TKT-001", level, "why", ts(NOW), &policy, &SlaThresholds::default())
            .unwrap_err();
        assert!(matches!(err, DeskError::InvalidLevel { .. }));
    }
    assert!(!book.get("TKT-001").unwrap().escalated);
}

#[test]
fn escalate_unknown_ticket_is_not_found() {
    let mut book = book();
    let err = book
        .escalate(
            "TKT-999",
            1,
            "why",
            ts(NOW),
            &EscalationPolicy::default(),
            &SlaThresholds::default(),
        )
        .unwrap_err();
    assert!(matches!(err, DeskError::TicketNotFound { ref id } if id == "TKT-999"));
}

#[test]
fn escalate_resolved_ticket_is_refused() {
    let mut book = book();
    let err = book
        .escalate(
            "TKT-003",
            1,
            "why",
            ts(NOW),
            &EscalationPolicy::default(),
            &SlaThresholds::default(),
        )
        .unwrap_err();
    assert!(matches!(err, DeskError::TicketClosed { .. }));
}

/// A second escalation must go to a higher level.
#[test]
fn re_escalation_only_raises_the_level() {
    let mut book = book();
    let policy = EscalationPolicy::default();
    let th = SlaThresholds::default();
    book.escalate("TKT-002", 1, "first", ts(NOW), &policy, &th).unwrap();

    let err = book
        .escalate("TKT-002", 1, "again", ts(NOW), &policy, &th)
        .unwrap_err();
    assert!(matches!(err, DeskError::AlreadyEscalated { level: 1, .. }));

    let t = book.escalate("TKT-002", 3, "manager", ts(NOW), &policy, &th).unwrap();
    assert_eq!(t.escalation_level(), 3);
    assert_eq!(t.escalation.as_ref().unwrap().reason, "manager");
}

/// Default policy accepts escalation at any progress.
#[test]
fn escalation_allowed_before_critical_by_default() {
    let mut book = book();
    let early = ts("2024-01-15T01:00:00Z");
    let t = book
        .escalate(
            "TKT-001",
            1,
            "requester is blocked",
            early,
            &EscalationPolicy::default(),
            &SlaThresholds::default(),
        )
        .unwrap();
    assert!(t.escalated);
}

#[test]
fn strict_policy_gates_on_critical_threshold() {
    let mut book = book();
    let policy = EscalationPolicy { require_critical: true, ..EscalationPolicy::default() };
    let th = SlaThresholds::default();

    let err = book
        .escalate("TKT-001", 1, "why", ts("2024-01-15T12:00:00Z"), &policy, &th)
        .unwrap_err();
    match err {
        DeskError::EscalationNotOffered { progress, required, .. } => {
            assert_eq!(progress, 50.0);
            assert_eq!(required, 80.0);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!book.get("TKT-001").unwrap().escalated);

    // 19.2h of 24h
    book.escalate("TKT-001", 1, "why", ts("2024-01-15T19:12:00Z"), &policy, &th)
        .unwrap();
    assert!(book.get("TKT-001").unwrap().escalated);
}

#[test]
fn escalation_moves_ticket_into_escalated_selector() {
    let mut book = book();
    assert!(selectors::escalated(book.as_slice()).is_empty());

    book.escalate(
        "TKT-001",
        1,
        "VIP",
        ts(NOW),
        &EscalationPolicy::default(),
        &SlaThresholds::default(),
    )
    .unwrap();

    let ids: Vec<&str> = selectors::escalated(book.as_slice())
        .iter()
        .map(|t| t.id.as_str())
        .collect();
    assert_eq!(ids, vec!["TKT-001"]);
}

#[test]
fn update_records_notes_without_touching_status() {
    let mut book = book();
    let t = book.update("TKT-002", "  Replaced access point\n", ts(NOW)).unwrap();
    assert_eq!(t.status, TicketStatus::InProgress);
    assert!(!t.escalated);
    assert_eq!(t.resolution_notes.as_deref(), Some("Replaced access point"));
    assert_eq!(t.updated_at, Some(ts(NOW)));

    assert!(matches!(
        book.update("TKT-002", " ", ts(NOW)).unwrap_err(),
        DeskError::Validation { field: "notes" }
    ));
}

/// Resolving keeps the escalation flag as history but drops the ticket
/// from the active set.
#[test]
fn resolve_closes_ticket_and_keeps_flag() {
    let mut book = book();
    book.escalate(
        "TKT-001",
        1,
        "VIP",
        ts(NOW),
        &EscalationPolicy::default(),
        &SlaThresholds::default(),
    )
    .unwrap();

    let t = book.resolve("TKT-001", " Monitor swapped ", ts(NOW)).unwrap();
    assert_eq!(t.status, TicketStatus::Resolved);
    assert_eq!(t.resolution_notes.as_deref(), Some("Monitor swapped"));
    assert!(t.escalated);
    assert!(!t.is_active());

    let err = book.resolve("TKT-001", "twice", ts(NOW)).unwrap_err();
    assert!(matches!(err, DeskError::TicketClosed { .. }));
    assert_eq!(selectors::active(book.as_slice()).len(), 1);
}

/// Notify produces a notification and leaves the ticket untouched.
#[test]
fn notify_does_not_mutate() {
    let book = book();
    let before = book.get("TKT-002").unwrap().clone();

    let n = book.notify("TKT-002", " Please check the AP ", ts(NOW)).unwrap();
    assert_eq!(n.ticket_id, "TKT-002");
    assert_eq!(n.message, "Please check the AP");
    assert_eq!(n.recipients, vec!["Jane Doe".to_string(), "Network Team".to_string()]);
    assert!(n.notification_id.starts_with("ntf-"));
    assert_eq!(book.get("TKT-002").unwrap(), &before);

    assert!(matches!(
        book.notify("TKT-002", "", ts(NOW)).unwrap_err(),
        DeskError::Validation { field: "message" }
    ));
    assert!(matches!(
        book.notify("nope", "hi", ts(NOW)).unwrap_err(),
        DeskError::TicketNotFound { .. }
    ));
}

#[test]
fn duplicate_ids_are_refused() {
    let mut book = book();
    let err = book.insert(ticket("TKT-001", TicketStatus::Open)).unwrap_err();
    assert!(matches!(err, DeskError::DuplicateTicket { .. }));
    assert_eq!(book.len(), 3);
}

/// A ticket loaded with status escalated but no flag gets the flag.
#[test]
fn escalated_status_implies_flag_on_insert() {
    let mut book = TicketBook::new();
    book.insert(ticket("TKT-004", TicketStatus::Escalated)).unwrap();
    assert!(book.get("TKT-004").unwrap().escalated);
    assert_eq!(selectors::escalated(book.as_slice()).len(), 1);
}

/// Staging leaves the book alone until the copy is committed.
#[test]
fn staging_does_not_touch_the_book() {
    let book = book();
    let before = book.get("TKT-001").unwrap().clone();

    let staged = book
        .stage_escalation(
            "TKT-001",
            1,
            "VIP",
            ts(NOW),
            &EscalationPolicy::default(),
            &SlaThresholds::default(),
        )
        .unwrap();
    assert!(staged.escalated);
    let resolved = book.stage_resolution("TKT-001", "done", ts(NOW)).unwrap();
    assert_eq!(resolved.status, TicketStatus::Resolved);

    assert_eq!(book.get("TKT-001").unwrap(), &before);
}
