//! Shared primitive types used across the desk.

use chrono::{DateTime, Utc};

/// One scheduler tick. The tick period is configured (default one minute).
pub type Tick = u64;

/// A stable, unique ticket identifier (e.g. `TKT-001`).
pub type TicketId = String;

/// Identifier of one desk session (one scheduler lifetime).
pub type SessionId = String;

/// Wall-clock instant. All SLA arithmetic happens in UTC.
pub type Timestamp = DateTime<Utc>;
