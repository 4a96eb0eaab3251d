//! Ticket records and their enumerations.
//!
//! A ticket carries two escalation signals: the `status` enum and the
//! `escalated` flag. They are kept as separate fields because upstream
//! ticket sources populate both. The flag is the one the dashboard
//! counts; `TicketBook` keeps `status == Escalated` implying the flag.

use crate::types::{TicketId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Escalated,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open       => "open",
            Self::InProgress => "in-progress",
            Self::Resolved   => "resolved",
            Self::Escalated  => "escalated",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open"        => Ok(Self::Open),
            "in-progress" => Ok(Self::InProgress),
            "resolved"    => Ok(Self::Resolved),
            "escalated"   => Ok(Self::Escalated),
            other         => Err(anyhow::anyhow!("Unknown ticket status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low    => "low",
            Self::Medium => "medium",
            Self::High   => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low"    => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high"   => Ok(Self::High),
            other    => Err(anyhow::anyhow!("Unknown priority: {other}")),
        }
    }
}

/// The most recent escalation applied to a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationRecord {
    pub level:        u8,
    pub reason:       String,
    pub escalated_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id:               TicketId,
    pub title:            String,
    #[serde(default)]
    pub description:      String,
    /// Requester display name.
    #[serde(default)]
    pub user:             String,
    #[serde(default)]
    pub category:         String,
    pub priority:         Priority,
    pub status:           TicketStatus,
    pub created_at:       Timestamp,
    pub sla_deadline:     Timestamp,
    #[serde(default)]
    pub assigned_to:      String,
    #[serde(default)]
    pub team:             String,
    #[serde(default)]
    pub escalated:        bool,
    #[serde(default)]
    pub escalation:       Option<EscalationRecord>,
    #[serde(default)]
    pub resolution_notes: Option<String>,
    #[serde(default)]
    pub updated_at:       Option<Timestamp>,
}

impl Ticket {
    /// Anything not yet resolved counts against the SLA.
    pub fn is_active(&self) -> bool {
        self.status != TicketStatus::Resolved
    }

    pub fn escalation_level(&self) -> u8 {
        self.escalation.as_ref().map(|e| e.level).unwrap_or(0)
    }

    /// True when the deadline does not lie after creation.
    pub fn has_malformed_window(&self) -> bool {
        self.sla_deadline <= self.created_at
    }
}
