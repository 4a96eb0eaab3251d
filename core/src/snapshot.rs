//! Snapshot serialization — full desk state to/from JSON.
//!
//! A snapshot is taken every `snapshot_interval_ticks` ticks.
//! It captures the ticket book and clock so a session can be resumed
//! without replaying the event log.

use crate::{
    clock::DeskClock,
    ticket::Ticket,
    types::{SessionId, Tick},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeskSnapshot {
    pub session_id: SessionId,
    pub tick:       Tick,
    pub clock:      DeskClock,
    pub tickets:    Vec<Ticket>,
}
