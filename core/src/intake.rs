//! Ticket intake — turns loosely-typed upstream records into `Ticket`s.
//!
//! Upstream sources send `created` as either a full RFC 3339 instant or a
//! bare date, and may omit `slaDeadline`. A missing deadline is stamped from
//! the SLA rule table; a present one is kept as sent.

use crate::{
    config::DeskConfig,
    error::{require_text, DeskError, DeskResult},
    ticket::{Priority, Ticket, TicketStatus},
    types::Timestamp,
};
use chrono::{NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDraft {
    pub id:               String,
    pub title:            String,
    #[serde(default)]
    pub description:      String,
    #[serde(default)]
    pub user:             String,
    #[serde(default)]
    pub category:         String,
    pub priority:         Priority,
    #[serde(default = "default_status")]
    pub status:           TicketStatus,
    #[serde(alias = "created")]
    pub created_at:       String,
    #[serde(default)]
    pub sla_deadline:     Option<String>,
    #[serde(default)]
    pub assigned_to:      String,
    #[serde(default)]
    pub team:             String,
    #[serde(default)]
    pub escalated:        bool,
    #[serde(default)]
    pub resolution_notes: Option<String>,
    #[serde(default)]
    pub updated_at:       Option<String>,
}

fn default_status() -> TicketStatus {
    TicketStatus::Open
}

/// Parse an RFC 3339 instant, or a `YYYY-MM-DD` date taken as midnight UTC.
pub fn parse_timestamp(raw: &str) -> DeskResult<Timestamp> {
    let raw = raw.trim();
    if let Ok(t) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| DeskError::InvalidTimestamp { value: raw.to_string() })
}

fn parse_optional(raw: Option<&str>) -> DeskResult<Option<Timestamp>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_timestamp(s).map(Some),
    }
}

impl TicketDraft {
    pub fn into_ticket(self, config: &DeskConfig) -> DeskResult<Ticket> {
        require_text("id", &self.id)?;
        let created_at = parse_timestamp(&self.created_at)?;
        let sla_deadline = match parse_optional(self.sla_deadline.as_deref())? {
            Some(deadline) => deadline,
            None => {
                let stamped = config.deadline_for(&self.category, self.priority, created_at);
                log::debug!("ticket {} stamped with deadline {stamped}", self.id);
                stamped
            }
        };
        let updated_at = parse_optional(self.updated_at.as_deref())?;

        Ok(Ticket {
            id: self.id,
            title: self.title,
            description: self.description,
            user: self.user,
            category: self.category,
            priority: self.priority,
            status: self.status,
            created_at,
            sla_deadline,
            assigned_to: self.assigned_to,
            team: self.team,
            escalated: self.escalated,
            escalation: None,
            resolution_notes: self.resolution_notes,
            updated_at,
        })
    }
}

/// Parse a JSON array of drafts into tickets.
pub fn tickets_from_json(json: &str, config: &DeskConfig) -> DeskResult<Vec<Ticket>> {
    let drafts: Vec<TicketDraft> = serde_json::from_str(json)?;
    drafts
        .into_iter()
        .map(|d| d.into_ticket(config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_date_is_midnight_utc() {
        let t = parse_timestamp("2024-01-15").unwrap();
        assert_eq!(t.to_rfc3339(), "2024-01-15T00:00:00+00:00");
    }

    #[test]
    fn offset_instant_is_normalised_to_utc() {
        let t = parse_timestamp("2024-01-16T16:00:00+02:00").unwrap();
        assert_eq!(t, parse_timestamp("2024-01-16T14:00:00Z").unwrap());
    }

    #[test]
    fn garbage_is_rejected() {
        let err = parse_timestamp("next tuesday").unwrap_err();
        assert!(matches!(err, DeskError::InvalidTimestamp { .. }));
    }
}
