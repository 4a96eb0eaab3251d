use serde::{Deserialize, Serialize};
use crate::types::{SessionId, Tick, TicketId};

/// Every user-issued action on a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum DeskCommand {
    Escalate {
        ticket_id: TicketId,
        level:     u8,
        reason:    String,
    },
    Notify {
        ticket_id: TicketId,
        message:   String,
    },
    Update {
        ticket_id: TicketId,
        notes:     String,
    },
    Resolve {
        ticket_id: TicketId,
        notes:     String,
    },
}

impl DeskCommand {
    pub fn ticket_id(&self) -> &str {
        match self {
            Self::Escalate { ticket_id, .. }
            | Self::Notify { ticket_id, .. }
            | Self::Update { ticket_id, .. }
            | Self::Resolve { ticket_id, .. } => ticket_id,
        }
    }

    pub fn command_type(&self) -> &'static str {
        match self {
            Self::Escalate { .. } => "escalate",
            Self::Notify { .. }   => "notify",
            Self::Update { .. }   => "update",
            Self::Resolve { .. }  => "resolve",
        }
    }
}

/// A command waiting for the next tick, with the tick it was queued at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedCommand {
    pub session_id: SessionId,
    pub queued_at:  Tick,
    pub command_id: String,
    pub command:    DeskCommand,
}
