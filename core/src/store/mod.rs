//! SQLite persistence adapter.
//!
//! RULE: Only the store talks to the database.
//! The engine calls store methods after the ticket book has changed;
//! the rules code (sla, selectors, ticket_book) never sees a connection.

use crate::{error::DeskResult, event::EventLogEntry, types::Tick};
mod ticket;
use rusqlite::{params, Connection, OptionalExtension};

pub struct DeskStore {
    conn: Connection,
}

impl DeskStore {
    pub fn open(path: &str) -> DeskResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only matters for real files; :memory: ignores it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> DeskResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> DeskResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_tickets.sql"))?;
        Ok(())
    }

    /// Run `f` inside one transaction. Any error rolls every write back.
    pub fn in_transaction<T>(&self, f: impl FnOnce() -> DeskResult<T>) -> DeskResult<T> {
        let tx = self.conn.unchecked_transaction()?;
        let out = f()?;
        tx.commit()?;
        Ok(out)
    }

    // ── Session ────────────────────────────────────────────────

    pub fn insert_session(
        &self,
        session_id: &str,
        version: &str,
        period_secs: u64,
        started_at: &str,
    ) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO session (session_id, version, period_secs, started_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![session_id, version, period_secs as i64, started_at],
        )?;
        Ok(())
    }

    pub fn session_exists(&self, session_id: &str) -> DeskResult<bool> {
        let found: Option<String> = self
            .conn
            .query_row(
                "SELECT session_id FROM session WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (session_id, tick, source, event_type, payload)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.session_id,
                entry.tick as i64,
                entry.source,
                entry.event_type,
                entry.payload,
            ],
        )?;
        Ok(())
    }

    pub fn events_for_tick(&self, session_id: &str, tick: Tick) -> DeskResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, tick, source, event_type, payload
             FROM event_log WHERE session_id = ?1 AND tick = ?2
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![session_id, tick as i64], event_row_mapper)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn events_of_type(&self, session_id: &str, event_type: &str) -> DeskResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, tick, source, event_type, payload
             FROM event_log WHERE session_id = ?1 AND event_type = ?2
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![session_id, event_type], event_row_mapper)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    pub fn event_count(&self, session_id: &str) -> DeskResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?)
    }

    // ── Snapshot ───────────────────────────────────────────────

    pub fn save_snapshot(&self, session_id: &str, tick: Tick, state_json: &str) -> DeskResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO snapshot (session_id, tick, state_json) VALUES (?1, ?2, ?3)",
            params![session_id, tick as i64, state_json],
        )?;
        Ok(())
    }

    /// Highest-tick snapshot for a session.
    pub fn latest_snapshot(&self, session_id: &str) -> DeskResult<Option<(Tick, String)>> {
        let result = self
            .conn
            .query_row(
                "SELECT tick, state_json FROM snapshot
                 WHERE session_id = ?1
                 ORDER BY tick DESC LIMIT 1",
                params![session_id],
                |row| Ok((row.get::<_, i64>(0)? as u64, row.get::<_, String>(1)?)),
            )
            .optional()?;
        Ok(result)
    }
}

fn event_row_mapper(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventLogEntry> {
    Ok(EventLogEntry {
        id:         Some(row.get(0)?),
        session_id: row.get(1)?,
        tick:       row.get::<_, i64>(2)? as u64,
        source:     row.get(3)?,
        event_type: row.get(4)?,
        payload:    row.get(5)?,
    })
}
