//! Notification hand-off.
//!
//! Notify never touches a ticket. It produces a `Notification` and hands it
//! to a sink. Delivery (email, SMS, in-app) belongs to whoever implements
//! the sink.

use crate::{
    error::DeskResult,
    types::{TicketId, Timestamp},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub notification_id: String,
    pub ticket_id:       TicketId,
    pub message:         String,
    /// Assignee and team at the time of sending.
    pub recipients:      Vec<String>,
    pub created_at:      Timestamp,
}

pub trait NotificationSink: Send {
    fn dispatch(&mut self, notification: &Notification) -> DeskResult<()>;
}

/// Writes notifications to the log. Default sink for the runner.
#[derive(Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn dispatch(&mut self, n: &Notification) -> DeskResult<()> {
        log::info!(
            "notify ticket={} to={:?}: {}",
            n.ticket_id,
            n.recipients,
            n.message
        );
        Ok(())
    }
}

/// Keeps every dispatched notification in a shared buffer.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    sent: std::sync::Arc<std::sync::Mutex<Vec<Notification>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }
}

impl NotificationSink for MemorySink {
    fn dispatch(&mut self, n: &Notification) -> DeskResult<()> {
        self.sent
            .lock()
            .map_err(|_| anyhow::anyhow!("notification buffer poisoned"))?
            .push(n.clone());
        Ok(())
    }
}
