//! SLA clock — pure derivation of progress, label and time remaining.
//!
//! Nothing here mutates a ticket or reads the wall clock. Callers pass the
//! shared `now` sampled once per tick, so every ticket on a board is
//! measured against the same instant.
//!
//! Malformed windows (deadline not after creation) read as fully elapsed.

use crate::{
    config::SlaThresholds,
    ticket::Ticket,
    types::Timestamp,
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaStatus {
    OnTrack,
    Warning,
    Critical,
    Overdue,
}

impl SlaStatus {
    /// First match wins: a passed deadline outranks any percentage.
    pub fn classify(progress: f64, deadline_passed: bool, thresholds: &SlaThresholds) -> Self {
        if deadline_passed {
            Self::Overdue
        } else if progress >= thresholds.critical_pct {
            Self::Critical
        } else if progress >= thresholds.warning_pct {
            Self::Warning
        } else {
            Self::OnTrack
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::OnTrack  => "On Track",
            Self::Warning  => "Warning",
            Self::Critical => "Critical",
            Self::Overdue  => "Overdue",
        }
    }

    /// Warning or Critical: close to the deadline but not past it.
    pub fn is_near_deadline(&self) -> bool {
        matches!(self, Self::Warning | Self::Critical)
    }
}

impl fmt::Display for SlaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Percentage of the SLA window elapsed at `now`, clamped to [0, 100].
pub fn progress(created_at: Timestamp, sla_deadline: Timestamp, now: Timestamp) -> f64 {
    let window_ms = (sla_deadline - created_at).num_milliseconds();
    if window_ms <= 0 {
        return 100.0;
    }
    let elapsed_ms = (now - created_at).num_milliseconds();
    // Scale before dividing so exact ratios (e.g. 19.2h of 24h) stay exact.
    let pct = (elapsed_ms as f64 * 100.0) / window_ms as f64;
    pct.clamp(0.0, 100.0)
}

/// Time left before the deadline, as shown next to each ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRemaining {
    Overdue,
    Left(chrono::Duration),
}

impl TimeRemaining {
    pub fn until(sla_deadline: Timestamp, now: Timestamp) -> Self {
        let left = sla_deadline - now;
        if left <= chrono::Duration::zero() {
            Self::Overdue
        } else {
            Self::Left(left)
        }
    }

    pub fn is_overdue(&self) -> bool {
        matches!(self, Self::Overdue)
    }
}

impl fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overdue => f.write_str("Overdue"),
            Self::Left(left) => {
                let minutes = left.num_minutes();
                let hours = minutes / 60;
                if hours >= 24 {
                    write!(f, "{}d {}h", hours / 24, hours % 24)
                } else {
                    write!(f, "{}h {}m", hours, minutes % 60)
                }
            }
        }
    }
}

/// Everything the SLA clock derives for one ticket at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlaReading {
    pub progress:  f64,
    pub status:    SlaStatus,
    pub remaining: TimeRemaining,
}

impl SlaReading {
    pub fn of(ticket: &Ticket, now: Timestamp, thresholds: &SlaThresholds) -> Self {
        let progress = progress(ticket.created_at, ticket.sla_deadline, now);
        let remaining = TimeRemaining::until(ticket.sla_deadline, now);
        let status = SlaStatus::classify(progress, remaining.is_overdue(), thresholds);
        Self { progress, status, remaining }
    }

    /// Whole-percent progress for display.
    pub fn progress_rounded(&self) -> u32 {
        self.progress.round() as u32
    }
}
