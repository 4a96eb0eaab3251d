use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation failed: '{field}' must not be empty")]
    Validation { field: &'static str },

    #[error("Invalid timestamp '{value}'")]
    InvalidTimestamp { value: String },

    #[error("Ticket '{id}' not found")]
    TicketNotFound { id: String },

    #[error("Ticket '{id}' already exists")]
    DuplicateTicket { id: String },

    #[error("Ticket '{id}' is resolved")]
    TicketClosed { id: String },

    #[error("Ticket '{id}' is already escalated at level {level}")]
    AlreadyEscalated { id: String, level: u8 },

    #[error("Escalation not offered for ticket '{id}': progress {progress:.1}% below {required:.0}%")]
    EscalationNotOffered { id: String, progress: f64, required: f64 },

    #[error("Escalation level {level} outside 1..={max}")]
    InvalidLevel { level: u8, max: u8 },

    #[error("Scheduler stopped")]
    SchedulerStopped,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DeskError {
    /// Recoverable rejections of a single command. The session carries on.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::TicketNotFound { .. }
                | Self::TicketClosed { .. }
                | Self::AlreadyEscalated { .. }
                | Self::EscalationNotOffered { .. }
                | Self::InvalidLevel { .. }
        )
    }
}

pub type DeskResult<T> = Result<T, DeskError>;

/// Reject empty or whitespace-only required text.
pub fn require_text(field: &'static str, value: &str) -> DeskResult<()> {
    if value.trim().is_empty() {
        return Err(DeskError::Validation { field });
    }
    Ok(())
}
