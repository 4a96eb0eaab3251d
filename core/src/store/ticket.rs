use super::DeskStore;
use crate::{
    error::DeskResult,
    ticket::{EscalationRecord, Ticket},
    types::Timestamp,
};
use rusqlite::{params, types::Type, OptionalExtension};

const TICKET_COLUMNS: &str = "ticket_id, title, description, requester, category, priority,
    status, created_at, sla_deadline, assigned_to, team, escalated,
    escalation_level, escalation_reason, escalated_at, resolution_notes, updated_at";

fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<Timestamp> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&chrono::Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn ts_col(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Timestamp> {
    parse_ts(idx, &row.get::<_, String>(idx)?)
}

fn opt_ts_col(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<Timestamp>> {
    row.get::<_, Option<String>>(idx)?
        .map(|raw| parse_ts(idx, &raw))
        .transpose()
}

fn enum_col<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = anyhow::Error>,
{
    row.get::<_, String>(idx)?
        .parse()
        .map_err(|e: anyhow::Error| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into())
        })
}

fn ticket_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<Ticket> {
    let escalation = match row.get::<_, Option<i64>>(12)? {
        Some(level) => Some(EscalationRecord {
            level:        level as u8,
            reason:       row.get::<_, Option<String>>(13)?.unwrap_or_default(),
            escalated_at: ts_col(row, 14)?,
        }),
        None => None,
    };
    Ok(Ticket {
        id:               row.get(0)?,
        title:            row.get(1)?,
        description:      row.get(2)?,
        user:             row.get(3)?,
        category:         row.get(4)?,
        priority:         enum_col(row, 5)?,
        status:           enum_col(row, 6)?,
        created_at:       ts_col(row, 7)?,
        sla_deadline:     ts_col(row, 8)?,
        assigned_to:      row.get(9)?,
        team:             row.get(10)?,
        escalated:        row.get::<_, i32>(11)? != 0,
        escalation,
        resolution_notes: row.get(15)?,
        updated_at:       opt_ts_col(row, 16)?,
    })
}

impl DeskStore {
    // ── Ticket ─────────────────────────────────────────────────────

    /// Insert or overwrite a ticket row with the in-memory record.
    pub fn upsert_ticket(&self, t: &Ticket) -> DeskResult<()> {
        let esc = t.escalation.as_ref();
        self.conn.execute(
            "INSERT INTO ticket (
                ticket_id, title, description, requester, category, priority,
                status, created_at, sla_deadline, assigned_to, team, escalated,
                escalation_level, escalation_reason, escalated_at, resolution_notes, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
             ON CONFLICT(ticket_id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                requester = excluded.requester,
                category = excluded.category,
                priority = excluded.priority,
                status = excluded.status,
                created_at = excluded.created_at,
                sla_deadline = excluded.sla_deadline,
                assigned_to = excluded.assigned_to,
                team = excluded.team,
                escalated = excluded.escalated,
                escalation_level = excluded.escalation_level,
                escalation_reason = excluded.escalation_reason,
                escalated_at = excluded.escalated_at,
                resolution_notes = excluded.resolution_notes,
                updated_at = excluded.updated_at",
            params![
                &t.id,
                &t.title,
                &t.description,
                &t.user,
                &t.category,
                t.priority.as_str(),
                t.status.as_str(),
                t.created_at.to_rfc3339(),
                t.sla_deadline.to_rfc3339(),
                &t.assigned_to,
                &t.team,
                if t.escalated { 1i32 } else { 0i32 },
                esc.map(|e| e.level as i64),
                esc.map(|e| e.reason.as_str()),
                esc.map(|e| e.escalated_at.to_rfc3339()),
                t.resolution_notes.as_deref(),
                t.updated_at.map(|u| u.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    pub fn get_ticket(&self, ticket_id: &str) -> DeskResult<Option<Ticket>> {
        let sql = format!("SELECT {TICKET_COLUMNS} FROM ticket WHERE ticket_id = ?1");
        self.conn
            .query_row(&sql, params![ticket_id], ticket_row_mapper)
            .optional()
            .map_err(Into::into)
    }

    /// All tickets, oldest first.
    pub fn load_tickets(&self) -> DeskResult<Vec<Ticket>> {
        let sql = format!("SELECT {TICKET_COLUMNS} FROM ticket ORDER BY created_at ASC, ticket_id ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], ticket_row_mapper)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn ticket_count_by_status(&self, status: &str) -> DeskResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM ticket WHERE status = ?1",
            params![status],
            |row| row.get(0),
        )?)
    }
}
