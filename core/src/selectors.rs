//! Read-side views over the ticket book: filters, counts and the SLA board.
//!
//! Board rows are ordered by ascending SLA deadline, ties broken by id.

use crate::{
    config::{DeskConfig, EscalationStep},
    sla::{SlaReading, SlaStatus, TimeRemaining},
    ticket::{Priority, Ticket, TicketStatus},
    types::{TicketId, Timestamp},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub fn active(tickets: &[Ticket]) -> Vec<&Ticket> {
    tickets.iter().filter(|t| t.is_active()).collect()
}

/// Flag-based: counts escalated tickets whatever their status.
pub fn escalated(tickets: &[Ticket]) -> Vec<&Ticket> {
    tickets.iter().filter(|t| t.escalated).collect()
}

pub fn overdue(tickets: &[Ticket], now: Timestamp) -> Vec<&Ticket> {
    tickets
        .iter()
        .filter(|t| t.is_active() && TimeRemaining::until(t.sla_deadline, now).is_overdue())
        .collect()
}

/// Share of active tickets not past their deadline, in whole percent.
/// 100 when nothing is active.
pub fn compliance_pct(tickets: &[Ticket], now: Timestamp) -> u32 {
    let active = active(tickets).len();
    if active == 0 {
        return 100;
    }
    let overdue = overdue(tickets, now).len();
    (((active - overdue) as f64 / active as f64) * 100.0).round() as u32
}

pub fn assigned_to<'a>(tickets: &'a [Ticket], agent: &str) -> Vec<&'a Ticket> {
    tickets.iter().filter(|t| t.assigned_to == agent).collect()
}

pub fn in_team<'a>(tickets: &'a [Ticket], team: &str) -> Vec<&'a Ticket> {
    tickets.iter().filter(|t| t.team == team).collect()
}

pub fn sort_by_deadline(tickets: &mut [&Ticket]) {
    tickets.sort_by(|a, b| {
        a.sla_deadline
            .cmp(&b.sla_deadline)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    pub total:       u32,
    pub open:        u32,
    pub in_progress: u32,
    pub resolved:    u32,
    pub escalated:   u32,
}

impl Workload {
    fn add(&mut self, ticket: &Ticket) {
        self.total += 1;
        match ticket.status {
            TicketStatus::Open       => self.open += 1,
            TicketStatus::InProgress => self.in_progress += 1,
            TicketStatus::Resolved   => self.resolved += 1,
            TicketStatus::Escalated  => {}
        }
        if ticket.escalated {
            self.escalated += 1;
        }
    }
}

fn workload_by(tickets: &[Ticket], key: impl Fn(&Ticket) -> &str) -> BTreeMap<String, Workload> {
    let mut out: BTreeMap<String, Workload> = BTreeMap::new();
    for ticket in tickets {
        let k = key(ticket);
        if k.is_empty() {
            continue;
        }
        out.entry(k.to_string()).or_default().add(ticket);
    }
    out
}

/// Unassigned tickets are skipped.
pub fn workload_by_agent(tickets: &[Ticket]) -> BTreeMap<String, Workload> {
    workload_by(tickets, |t| t.assigned_to.as_str())
}

pub fn workload_by_team(tickets: &[Ticket]) -> BTreeMap<String, Workload> {
    workload_by(tickets, |t| t.team.as_str())
}

/// One line of the SLA tracking board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaRow {
    pub ticket_id:        TicketId,
    pub title:            String,
    pub priority:         Priority,
    pub assigned_to:      String,
    pub team:             String,
    pub escalated:        bool,
    pub progress:         f64,
    pub status:           SlaStatus,
    pub time_remaining:   String,
    /// The dashboard offers "Escalate" only past the critical threshold.
    pub escalate_offered: bool,
    /// Highest escalation step of the ticket's SLA rule reached so far.
    pub due_step:         Option<EscalationStep>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaSummary {
    pub active:         usize,
    pub escalated:      usize,
    pub overdue:        usize,
    pub near_deadline:  usize,
    pub compliance_pct: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlaBoard {
    pub now:     Timestamp,
    pub rows:    Vec<SlaRow>,
    pub summary: SlaSummary,
}

pub fn row_for(ticket: &Ticket, now: Timestamp, config: &DeskConfig) -> SlaRow {
    let reading = SlaReading::of(ticket, now, &config.thresholds);
    let past_critical = reading.progress >= config.thresholds.critical_pct;
    SlaRow {
        ticket_id:        ticket.id.clone(),
        title:            ticket.title.clone(),
        priority:         ticket.priority,
        assigned_to:      ticket.assigned_to.clone(),
        team:             ticket.team.clone(),
        escalated:        ticket.escalated,
        progress:         reading.progress,
        status:           reading.status,
        time_remaining:   reading.remaining.to_string(),
        escalate_offered: past_critical && !ticket.escalated,
        due_step:         config.due_step(ticket, now).cloned(),
    }
}

/// Build the board for every active ticket at `now`.
pub fn board(tickets: &[Ticket], now: Timestamp, config: &DeskConfig) -> SlaBoard {
    let mut active = active(tickets);
    sort_by_deadline(&mut active);

    let rows: Vec<SlaRow> = active
        .iter()
        .map(|t| row_for(t, now, config))
        .collect();

    let summary = SlaSummary {
        active:         rows.len(),
        escalated:      escalated(tickets).len(),
        overdue:        rows.iter().filter(|r| r.status == SlaStatus::Overdue).count(),
        near_deadline:  rows.iter().filter(|r| r.status.is_near_deadline()).count(),
        compliance_pct: compliance_pct(tickets, now),
    };

    SlaBoard { now, rows, summary }
}
