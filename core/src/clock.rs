//! Desk clock — owns the tick counter and the shared "now".
//!
//! One reading of the wall clock per tick feeds every ticket on the board.

use crate::types::{SessionId, Tick, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeskClock {
    pub session_id:   SessionId,
    pub current_tick: Tick,
    pub period_secs:  u64,
    /// None until the first tick.
    pub now:          Option<Timestamp>,
}

impl DeskClock {
    pub fn new(session_id: SessionId, period_secs: u64) -> Self {
        Self {
            session_id,
            current_tick: 0,
            period_secs,
            now: None,
        }
    }

    /// Advance one tick with a fresh wall-clock sample. Returns the new tick.
    /// A sample earlier than the previous one is ignored so that derived
    /// progress never runs backwards.
    pub fn advance(&mut self, sampled: Timestamp) -> Tick {
        self.current_tick += 1;
        match self.now {
            Some(prev) if sampled < prev => {
                log::warn!("clock went backwards ({sampled} < {prev}); holding {prev}");
            }
            _ => self.now = Some(sampled),
        }
        self.current_tick
    }

    pub fn period(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.period_secs)
    }
}
