//! Selector and board tests — filters, compliance and ordering.

use chrono::{DateTime, Duration, Utc};
use desk_core::{
    config::DeskConfig,
    demo,
    selectors,
    sla::SlaStatus,
    ticket::{Priority, Ticket, TicketStatus},
};

fn ts(raw: &str) -> DateTime<Utc> {
    raw.parse().expect("valid RFC 3339")
}

fn ticket(id: &str, status: TicketStatus, created: &str, deadline: &str) -> Ticket {
    Ticket {
        id:               id.into(),
        title:            format!("Ticket {id}"),
        description:      String::new(),
        user:             "Sarah Johnson".into(),
        category:         "Software".into(),
        priority:         Priority::Low,
        status,
        created_at:       ts(created),
        sla_deadline:     ts(deadline),
        assigned_to:      "Bob Wilson".into(),
        team:             "Software Support".into(),
        escalated:        status == TicketStatus::Escalated,
        escalation:       None,
        resolution_notes: None,
        updated_at:       None,
    }
}

/// The dashboard walkthrough: three fixture tickets at 2024-01-15T13:00Z.
#[test]
fn fixture_board_matches_walkthrough() {
    let tickets = demo::fixture_tickets();
    let board = selectors::board(&tickets, ts("2024-01-15T13:00:00Z"), &DeskConfig::default_test());

    let ids: Vec<&str> = board.rows.iter().map(|r| r.ticket_id.as_str()).collect();
    assert_eq!(ids, vec!["TKT-004", "TKT-001", "TKT-002"]);

    // TKT-004 passed its deadline an hour ago.
    assert_eq!(board.rows[0].status, SlaStatus::Overdue);
    assert_eq!(board.rows[0].time_remaining, "Overdue");
    assert!(board.rows[0].escalated);
    assert!(!board.rows[0].escalate_offered);

    // TKT-001: 13h of a 38h window.
    assert_eq!(board.rows[1].status, SlaStatus::OnTrack);
    assert_eq!(board.rows[1].time_remaining, "1d 1h");

    assert_eq!(board.summary.active, 3);
    assert_eq!(board.summary.escalated, 1);
    assert_eq!(board.summary.overdue, 1);
    assert_eq!(board.summary.compliance_pct, 67);
}

#[test]
fn overdue_lists_only_active_tickets_past_deadline() {
    let tickets = vec![
        ticket("A", TicketStatus::Open, "2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z"),
        ticket("B", TicketStatus::Resolved, "2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z"),
        ticket("C", TicketStatus::InProgress, "2024-01-01T00:00:00Z", "2024-01-10T00:00:00Z"),
        ticket("D", TicketStatus::Escalated, "2024-01-01T00:00:00Z", "2024-01-03T00:00:00Z"),
    ];
    let now = ts("2024-01-05T00:00:00Z");

    let ids: Vec<&str> = selectors::overdue(&tickets, now).iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "D"]);
    assert_eq!(selectors::compliance_pct(&tickets, now), 33);
}

/// One overdue out of ten active reads 90%.
#[test]
fn compliance_one_in_ten_overdue() {
    let mut tickets: Vec<Ticket> = (0..9)
        .map(|i| {
            ticket(
                &format!("OK-{i}"),
                TicketStatus::Open,
                "2024-01-01T00:00:00Z",
                "2024-02-01T00:00:00Z",
            )
        })
        .collect();
    tickets.push(ticket("LATE", TicketStatus::Open, "2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z"));
    // Resolved tickets never count, even when long past their deadline.
    tickets.push(ticket("DONE", TicketStatus::Resolved, "2023-01-01T00:00:00Z", "2023-01-02T00:00:00Z"));

    assert_eq!(selectors::compliance_pct(&tickets, ts("2024-01-15T00:00:00Z")), 90);
}

#[test]
fn compliance_with_nothing_active_is_full() {
    let tickets = vec![ticket(
        "DONE",
        TicketStatus::Resolved,
        "2023-01-01T00:00:00Z",
        "2023-01-02T00:00:00Z",
    )];
    assert_eq!(selectors::compliance_pct(&tickets, ts("2024-01-15T00:00:00Z")), 100);
    assert_eq!(selectors::compliance_pct(&[], ts("2024-01-15T00:00:00Z")), 100);
}

/// Equal deadlines fall back to id order.
#[test]
fn board_orders_by_deadline_then_id() {
    let tickets = vec![
        ticket("T-3", TicketStatus::Open, "2024-01-01T00:00:00Z", "2024-01-04T00:00:00Z"),
        ticket("T-2", TicketStatus::Open, "2024-01-01T00:00:00Z", "2024-01-03T00:00:00Z"),
        ticket("T-1", TicketStatus::Open, "2024-01-01T00:00:00Z", "2024-01-03T00:00:00Z"),
        ticket("T-0", TicketStatus::Resolved, "2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z"),
    ];
    let board = selectors::board(&tickets, ts("2024-01-01T12:00:00Z"), &DeskConfig::default_test());
    let ids: Vec<&str> = board.rows.iter().map(|r| r.ticket_id.as_str()).collect();
    assert_eq!(ids, vec!["T-1", "T-2", "T-3"]);
}

#[test]
fn escalate_offered_only_past_critical_and_not_yet_escalated() {
    let created = "2024-01-15T00:00:00Z";
    let deadline = "2024-01-16T00:00:00Z";
    let tickets = vec![
        ticket("EARLY", TicketStatus::Open, created, deadline),
        ticket("DONE", TicketStatus::Escalated, created, deadline),
    ];
    let config = DeskConfig::default_test();

    let early = selectors::row_for(&tickets[0], ts("2024-01-15T10:00:00Z"), &config);
    assert!(!early.escalate_offered);

    let late = selectors::row_for(&tickets[0], ts("2024-01-15T20:00:00Z"), &config);
    assert_eq!(late.status, SlaStatus::Critical);
    assert!(late.escalate_offered);

    let already = selectors::row_for(&tickets[1], ts("2024-01-15T20:00:00Z"), &config);
    assert!(!already.escalate_offered);
}

#[test]
fn summary_counts_near_deadline() {
    let created = "2024-01-15T00:00:00Z";
    let tickets = vec![
        ticket("ON", TicketStatus::Open, created, "2024-01-20T00:00:00Z"),
        ticket("WARN", TicketStatus::Open, created, "2024-01-15T18:00:00Z"),
        ticket("CRIT", TicketStatus::Open, created, "2024-01-15T12:30:00Z"),
        ticket("LATE", TicketStatus::Open, created, "2024-01-15T06:00:00Z"),
    ];
    let board = selectors::board(&tickets, ts("2024-01-15T12:00:00Z"), &DeskConfig::default_test());

    let statuses: Vec<SlaStatus> = board.rows.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![SlaStatus::Overdue, SlaStatus::Critical, SlaStatus::Warning, SlaStatus::OnTrack]
    );
    assert_eq!(board.summary.near_deadline, 2);
    assert_eq!(board.summary.overdue, 1);
    assert_eq!(board.summary.compliance_pct, 75);
}

#[test]
fn assignee_and_team_filters() {
    let mut tickets = demo::fixture_tickets();
    tickets[1].assigned_to = "John Smith".into();

    let johns: Vec<&str> = selectors::assigned_to(&tickets, "John Smith")
        .iter()
        .map(|t| t.id.as_str())
        .collect();
    assert_eq!(johns, vec!["TKT-001", "TKT-002"]);

    assert_eq!(selectors::in_team(&tickets, "Network Team").len(), 1);
    assert!(selectors::in_team(&tickets, "Facilities").is_empty());
}

#[test]
fn workload_groups_by_team_and_agent() {
    let mut tickets = demo::fixture_tickets();
    let mut extra = tickets[0].clone();
    extra.id = "TKT-005".into();
    extra.status = TicketStatus::Resolved;
    extra.created_at -= Duration::days(3);
    tickets.push(extra);

    let mut unassigned = tickets[0].clone();
    unassigned.id = "TKT-006".into();
    unassigned.assigned_to = String::new();
    tickets.push(unassigned);

    let by_team = selectors::workload_by_team(&tickets);
    let hw = &by_team["Hardware Support"];
    assert_eq!((hw.total, hw.open, hw.resolved), (3, 2, 1));
    assert_eq!(by_team["Software Support"].escalated, 1);

    let by_agent = selectors::workload_by_agent(&tickets);
    assert_eq!(by_agent["John Smith"].total, 2);
    assert!(!by_agent.contains_key(""));
    assert_eq!(by_agent.len(), 3);
}

/// Rows carry the highest escalation step of their SLA rule reached so far.
#[test]
fn due_step_follows_rule_thresholds() {
    let config = DeskConfig::default_test();
    let mut t = ticket("HW", TicketStatus::Open, "2024-01-15T00:00:00Z", "2024-01-15T04:00:00Z");
    t.category = "Hardware".into();
    t.priority = Priority::High;

    let early = selectors::row_for(&t, ts("2024-01-15T01:00:00Z"), &config);
    assert!(early.due_step.is_none());

    let lead = selectors::row_for(&t, ts("2024-01-15T02:30:00Z"), &config);
    let step = lead.due_step.unwrap();
    assert_eq!(step.level, 1);
    assert_eq!(step.action, "Notify Team Lead");

    let manager = selectors::row_for(&t, ts("2024-01-15T03:10:00Z"), &config);
    assert_eq!(manager.due_step.unwrap().level, 2);

    // Before creation there is nothing due.
    let before = selectors::row_for(&t, ts("2024-01-14T23:00:00Z"), &config);
    assert!(before.due_step.is_none());
}

#[test]
fn due_step_absent_without_rules() {
    let mut config = DeskConfig::default_test();
    config.sla_rules.clear();
    let t = ticket("SW", TicketStatus::Open, "2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z");
    assert!(selectors::row_for(&t, ts("2024-01-01T20:00:00Z"), &config).due_step.is_none());
}
