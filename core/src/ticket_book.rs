//! The ticket book — the one owned collection of tickets.
//!
//! RULE: only the methods here mutate a ticket.
//! Read-side code (sla.rs, selectors.rs) borrows `as_slice()` and never
//! writes. Notify takes `&self`, so it cannot change anything.
//!
//! Every mutation is staged on a copy first. The engine persists the staged
//! copy and only then commits it, so a rejected command or a failed write
//! leaves the book exactly as it was.

use crate::{
    config::{EscalationPolicy, SlaThresholds},
    error::{require_text, DeskError, DeskResult},
    notification::Notification,
    sla,
    ticket::{EscalationRecord, Ticket, TicketStatus},
    types::Timestamp,
};
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct TicketBook {
    tickets: Vec<Ticket>,
    index:   HashMap<String, usize>,
}

impl TicketBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tickets(tickets: impl IntoIterator<Item = Ticket>) -> DeskResult<Self> {
        let mut book = Self::new();
        for ticket in tickets {
            book.insert(ticket)?;
        }
        Ok(book)
    }

    /// Add a ticket. A ticket whose status is `escalated` always carries the
    /// flag too; the reverse is left alone.
    pub fn insert(&mut self, mut ticket: Ticket) -> DeskResult<()> {
        if self.index.contains_key(&ticket.id) {
            return Err(DeskError::DuplicateTicket { id: ticket.id });
        }
        if ticket.status == TicketStatus::Escalated && !ticket.escalated {
            log::warn!("ticket {} has status escalated without the flag; setting it", ticket.id);
            ticket.escalated = true;
        }
        if ticket.has_malformed_window() {
            log::warn!(
                "ticket {} deadline {} is not after creation {}; it will read as overdue",
                ticket.id,
                ticket.sla_deadline,
                ticket.created_at
            );
        }
        self.index.insert(ticket.id.clone(), self.tickets.len());
        self.tickets.push(ticket);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Ticket> {
        self.index.get(id).map(|&i| &self.tickets[i])
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// Tickets in insertion order.
    pub fn as_slice(&self) -> &[Ticket] {
        &self.tickets
    }

    fn staged_copy(&self, id: &str) -> DeskResult<Ticket> {
        self.get(id)
            .cloned()
            .ok_or_else(|| DeskError::TicketNotFound { id: id.to_string() })
    }

    /// Replace a ticket with a copy produced by one of the `stage_*` methods.
    pub(crate) fn commit(&mut self, ticket: Ticket) -> DeskResult<&Ticket> {
        let i = *self
            .index
            .get(&ticket.id)
            .ok_or_else(|| DeskError::TicketNotFound { id: ticket.id.clone() })?;
        self.tickets[i] = ticket;
        Ok(&self.tickets[i])
    }

    /// The ticket as it would look escalated at `level`. The book is not touched.
    ///
    /// An escalated ticket may only be raised to a higher level. With
    /// `policy.require_critical` set, the ticket must also have reached the
    /// critical threshold.
    pub fn stage_escalation(
        &self,
        id: &str,
        level: u8,
        reason: &str,
        now: Timestamp,
        policy: &EscalationPolicy,
        thresholds: &SlaThresholds,
    ) -> DeskResult<Ticket> {
        require_text("reason", reason)?;
        if level == 0 || level > policy.max_level {
            return Err(DeskError::InvalidLevel { level, max: policy.max_level });
        }

        let mut ticket = self.staged_copy(id)?;
        if ticket.status == TicketStatus::Resolved {
            return Err(DeskError::TicketClosed { id: ticket.id });
        }
        if ticket.escalated && level <= ticket.escalation_level() {
            let current = ticket.escalation_level();
            return Err(DeskError::AlreadyEscalated { id: ticket.id, level: current });
        }
        if policy.require_critical {
            let progress = sla::progress(ticket.created_at, ticket.sla_deadline, now);
            if progress < thresholds.critical_pct {
                return Err(DeskError::EscalationNotOffered {
                    id: ticket.id,
                    progress,
                    required: thresholds.critical_pct,
                });
            }
        }

        ticket.escalated = true;
        ticket.status = TicketStatus::Escalated;
        ticket.updated_at = Some(now);
        ticket.escalation = Some(EscalationRecord {
            level,
            reason: reason.trim().to_string(),
            escalated_at: now,
        });
        Ok(ticket)
    }

    /// Mark a ticket escalated at `level` with a recorded reason.
    pub fn escalate(
        &mut self,
        id: &str,
        level: u8,
        reason: &str,
        now: Timestamp,
        policy: &EscalationPolicy,
        thresholds: &SlaThresholds,
    ) -> DeskResult<&Ticket> {
        let staged = self.stage_escalation(id, level, reason, now, policy, thresholds)?;
        self.commit(staged)
    }

    /// Build a notification for a ticket. Never changes the ticket.
    pub fn notify(&self, id: &str, message: &str, now: Timestamp) -> DeskResult<Notification> {
        require_text("message", message)?;
        let ticket = self
            .get(id)
            .ok_or_else(|| DeskError::TicketNotFound { id: id.to_string() })?;

        let recipients = [&ticket.assigned_to, &ticket.team]
            .into_iter()
            .filter(|r| !r.trim().is_empty())
            .cloned()
            .collect();

        Ok(Notification {
            notification_id: format!("ntf-{}", uuid::Uuid::new_v4().simple()),
            ticket_id: ticket.id.clone(),
            message: message.trim().to_string(),
            recipients,
            created_at: now,
        })
    }

    /// Progress notes on a copy. Status and the escalation flag stay as they are.
    pub fn stage_update(&self, id: &str, notes: &str, now: Timestamp) -> DeskResult<Ticket> {
        require_text("notes", notes)?;
        let mut ticket = self.staged_copy(id)?;
        ticket.resolution_notes = Some(notes.trim().to_string());
        ticket.updated_at = Some(now);
        Ok(ticket)
    }

    pub fn update(&mut self, id: &str, notes: &str, now: Timestamp) -> DeskResult<&Ticket> {
        let staged = self.stage_update(id, notes, now)?;
        self.commit(staged)
    }

    /// A resolved copy. The escalation flag is kept as history.
    pub fn stage_resolution(&self, id: &str, notes: &str, now: Timestamp) -> DeskResult<Ticket> {
        require_text("notes", notes)?;
        let mut ticket = self.staged_copy(id)?;
        if ticket.status == TicketStatus::Resolved {
            return Err(DeskError::TicketClosed { id: ticket.id });
        }
        ticket.status = TicketStatus::Resolved;
        ticket.resolution_notes = Some(notes.trim().to_string());
        ticket.updated_at = Some(now);
        Ok(ticket)
    }

    pub fn resolve(&mut self, id: &str, notes: &str, now: Timestamp) -> DeskResult<&Ticket> {
        let staged = self.stage_resolution(id, notes, now)?;
        self.commit(staged)
    }
}
