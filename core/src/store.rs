//! SQLite persistence for editing sessions.
//!
//! RULE: store.rs is the only module that issues SQL.
//! The session calls store methods; it never executes SQL directly.
//! Settlement results are not persisted: they are recomputed from the
//! stored draft and ledger whenever needed.

use crate::{
    error::EngineResult,
    event::EventLogEntry,
    input::SettlementInput,
    ledger::AuthorizedDiscountEntry,
    types::{EntryId, SessionId},
};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Metadata of a stored session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRow {
    pub session_id:    SessionId,
    pub policy_id:     String,
    pub version:       String,
    pub opened_at:     DateTime<Utc>,
    /// Next ledger id to hand out. Never lowered by deletions.
    pub next_entry_id: EntryId,
}

pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    /// Open (or create) the session database at `path`.
    pub fn open(path: &str) -> EngineResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only for real files; :memory: ignores it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> EngineResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> EngineResult<()> {
        self.conn
            .execute_batch(include_str!("../../migrations/001_session.sql"))?;
        Ok(())
    }

    // ── Session ────────────────────────────────────────────────

    pub fn insert_session(
        &self,
        session_id: &str,
        policy_id: &str,
        version: &str,
        opened_at: DateTime<Utc>,
    ) -> EngineResult<()> {
        self.conn.execute(
            "INSERT INTO session (session_id, policy_id, version, opened_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![session_id, policy_id, version, opened_at.to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn get_session(&self, session_id: &str) -> EngineResult<Option<SessionRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT session_id, policy_id, version, opened_at, next_entry_id
                 FROM session WHERE session_id = ?1",
                params![session_id],
                |row| {
                    Ok(SessionRow {
                        session_id:    row.get(0)?,
                        policy_id:     row.get(1)?,
                        version:       row.get(2)?,
                        opened_at:     parse_timestamp(3, &row.get::<_, String>(3)?)?,
                        next_entry_id: row.get::<_, i64>(4)? as EntryId,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    // ── Input draft ────────────────────────────────────────────

    /// Upsert the input draft, together with its event when one is given.
    pub fn save_input(
        &self,
        session_id: &str,
        input: &SettlementInput,
        event: Option<&EventLogEntry>,
    ) -> EngineResult<()> {
        let json = serde_json::to_string(input)?;
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO input_draft (session_id, input_json, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(session_id) DO UPDATE SET
                 input_json = excluded.input_json,
                 updated_at = excluded.updated_at",
            params![session_id, json, Utc::now().to_rfc3339()],
        )?;
        if let Some(event) = event {
            insert_event(&tx, event)?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn load_input(&self, session_id: &str) -> EngineResult<Option<SettlementInput>> {
        let json: Option<String> = self
            .conn
            .query_row(
                "SELECT input_json FROM input_draft WHERE session_id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()?;
        match json {
            Some(j) => Ok(Some(serde_json::from_str(&j)?)),
            None => Ok(None),
        }
    }

    // ── Authorized-discount ledger ─────────────────────────────

    /// Insert one ledger entry, raise the session's id high-water mark
    /// and log `event`, all in one transaction.
    pub fn insert_discount(
        &self,
        session_id: &str,
        entry: &AuthorizedDiscountEntry,
        event: &EventLogEntry,
    ) -> EngineResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO authorized_discount
                 (session_id, entry_id, amount, authorized_by, entry_date, reservation_ref)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session_id,
                entry.id as i64,
                entry.amount.to_string(),
                entry.authorized_by,
                entry.date.map(|d| d.format("%Y-%m-%d").to_string()),
                entry.reservation_ref,
            ],
        )?;
        tx.execute(
            "UPDATE session SET next_entry_id = MAX(next_entry_id, ?2) WHERE session_id = ?1",
            params![session_id, (entry.id + 1) as i64],
        )?;
        insert_event(&tx, event)?;
        tx.commit()?;
        Ok(())
    }

    /// Delete one ledger entry and log `event` in one transaction.
    /// Returns false when no row matched.
    pub fn delete_discount(
        &self,
        session_id: &str,
        entry_id: EntryId,
        event: &EventLogEntry,
    ) -> EngineResult<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let deleted = tx.execute(
            "DELETE FROM authorized_discount WHERE session_id = ?1 AND entry_id = ?2",
            params![session_id, entry_id as i64],
        )?;
        insert_event(&tx, event)?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    /// All ledger entries of a session, in insertion (id) order.
    pub fn discounts_for_session(
        &self,
        session_id: &str,
    ) -> EngineResult<Vec<AuthorizedDiscountEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT entry_id, amount, authorized_by, entry_date, reservation_ref
             FROM authorized_discount WHERE session_id = ?1
             ORDER BY entry_id ASC",
        )?;
        let entries = stmt
            .query_map(params![session_id], |row| {
                let amount: String = row.get(1)?;
                let date: Option<String> = row.get(3)?;
                Ok(AuthorizedDiscountEntry {
                    id:              row.get::<_, i64>(0)? as EntryId,
                    amount:          Decimal::from_str(&amount)
                        .map_err(|e| conversion_error(1, e))?,
                    authorized_by:   row.get(2)?,
                    date:            date
                        .map(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d"))
                        .transpose()
                        .map_err(|e| conversion_error(3, e))?,
                    reservation_ref: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> EngineResult<()> {
        insert_event(&self.conn, entry)?;
        Ok(())
    }

    pub fn events_for_session(&self, session_id: &str) -> EngineResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, sequence, event_type, payload, recorded_at
             FROM event_log WHERE session_id = ?1
             ORDER BY sequence ASC, id ASC",
        )?;
        let entries = stmt
            .query_map(params![session_id], |row| {
                Ok(EventLogEntry {
                    id:          Some(row.get(0)?),
                    session_id:  row.get(1)?,
                    sequence:    row.get::<_, i64>(2)? as u64,
                    event_type:  row.get(3)?,
                    payload:     row.get(4)?,
                    recorded_at: parse_timestamp(5, &row.get::<_, String>(5)?)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Highest event sequence recorded for a session, if any.
    pub fn last_event_sequence(&self, session_id: &str) -> EngineResult<Option<u64>> {
        let seq: Option<i64> = self.conn.query_row(
            "SELECT MAX(sequence) FROM event_log WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(seq.map(|s| s as u64))
    }
}

fn insert_event(conn: &Connection, entry: &EventLogEntry) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO event_log (session_id, sequence, event_type, payload, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            entry.session_id,
            entry.sequence as i64,
            entry.event_type,
            entry.payload,
            entry.recorded_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn parse_timestamp(col: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(col, e))
}

fn conversion_error<E>(col: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(col, Type::Text, Box::new(err))
}
