//! The desk event log.
//!
//! RULE: every state change and every SLA label transition is recorded as
//! an event. Events are appended, never rewritten.

use crate::{
    sla::SlaStatus,
    types::{SessionId, Tick, TicketId, Timestamp},
};
use serde::{Deserialize, Serialize};

/// Variants are appended over time — never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeskEvent {
    // ── Session events ─────────────────────────────
    SessionInitialized {
        session_id: SessionId,
        tickets:    usize,
    },
    TickStarted {
        tick: Tick,
        now:  Timestamp,
    },
    TickCompleted {
        tick: Tick,
    },
    TicketLoaded {
        ticket_id:    TicketId,
        sla_deadline: Timestamp,
    },

    // ── Tracker events ─────────────────────────────
    TicketEscalated {
        ticket_id: TicketId,
        level:     u8,
        reason:    String,
        at:        Timestamp,
    },
    NotificationDispatched {
        notification_id: String,
        ticket_id:       TicketId,
        at:              Timestamp,
    },
    TicketUpdated {
        ticket_id: TicketId,
        at:        Timestamp,
    },
    TicketResolved {
        ticket_id: TicketId,
        at:        Timestamp,
    },
    CommandRejected {
        command_id: String,
        ticket_id:  TicketId,
        reason:     String,
    },

    // ── SLA clock events ───────────────────────────
    SlaStatusChanged {
        tick:      Tick,
        ticket_id: TicketId,
        from:      SlaStatus,
        to:        SlaStatus,
        progress:  f64,
    },
}

/// A row in the event_log table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub session_id: SessionId,
    pub tick:       Tick,
    pub source:     String,
    pub event_type: String,
    pub payload:    String,
}
