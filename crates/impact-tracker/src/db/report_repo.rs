//! Report repository — idempotent upserts keyed by (ngo_id, month).

use chrono::Utc;
use rusqlite::{params, Row};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{Database, DatabaseError};

/// A validated report ready to be stored. Produced by the row validator
/// or the single-submission path; never built from unchecked input.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRecord {
    pub ngo_id: String,
    pub month: String,
    pub people_helped: i64,
    pub events_conducted: i64,
    pub funds_utilized: Decimal,
}

/// A stored report row.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub ngo_id: String,
    pub month: String,
    pub people_helped: i64,
    pub events_conducted: i64,
    pub funds_utilized: Decimal,
    pub created_at: String,
    pub updated_at: String,
}

impl ReportRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            ngo_id: row.get("ngo_id")?,
            month: row.get("month")?,
            people_helped: row.get("people_helped")?,
            events_conducted: row.get("events_conducted")?,
            funds_utilized: from_cents(row.get("funds_utilized_cents")?),
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Whether an upsert inserted a fresh row or overwrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Converts a 2-digit decimal amount to integer cents for storage.
///
/// Amounts are quantized to 2 fractional digits before they reach the
/// repo, so the multiplication is exact.
pub fn to_cents(amount: Decimal) -> i64 {
    use rust_decimal::prelude::ToPrimitive;
    (amount * Decimal::from(100))
        .round()
        .to_i64()
        .unwrap_or(i64::MAX)
}

/// Converts stored integer cents back to a 2-digit decimal.
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Inserts or overwrites the report for `(ngo_id, month)` inside a single
/// transaction. `created_at` survives overwrites; `updated_at` does not.
pub fn upsert(
    db: &Database,
    record: &ReportRecord,
) -> Result<(UpsertOutcome, ReportRow), DatabaseError> {
    let now = Utc::now().to_rfc3339();
    db.with_tx(|conn| {
        let existing = {
            let mut stmt =
                conn.prepare("SELECT created_at FROM reports WHERE ngo_id = ?1 AND month = ?2")?;
            let mut rows =
                stmt.query_map(params![record.ngo_id, record.month], |r| {
                    r.get::<_, String>(0)
                })?;
            match rows.next() {
                Some(Ok(created_at)) => Some(created_at),
                Some(Err(e)) => return Err(DatabaseError::Sqlite(e)),
                None => None,
            }
        };

        let outcome = match existing {
            Some(_) => {
                conn.execute(
                    "UPDATE reports SET people_helped = ?3, events_conducted = ?4,
                     funds_utilized_cents = ?5, updated_at = ?6
                     WHERE ngo_id = ?1 AND month = ?2",
                    params![
                        record.ngo_id,
                        record.month,
                        record.people_helped,
                        record.events_conducted,
                        to_cents(record.funds_utilized),
                        now,
                    ],
                )?;
                UpsertOutcome::Updated
            }
            None => {
                conn.execute(
                    "INSERT INTO reports (ngo_id, month, people_helped, events_conducted,
                     funds_utilized_cents, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                    params![
                        record.ngo_id,
                        record.month,
                        record.people_helped,
                        record.events_conducted,
                        to_cents(record.funds_utilized),
                        now,
                    ],
                )?;
                UpsertOutcome::Created
            }
        };

        let mut stmt =
            conn.prepare("SELECT * FROM reports WHERE ngo_id = ?1 AND month = ?2")?;
        let mut rows = stmt.query_map(params![record.ngo_id, record.month], ReportRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok((outcome, row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Err(DatabaseError::Sqlite(rusqlite::Error::QueryReturnedNoRows)),
        }
    })
}

/// Finds the report for `(ngo_id, month)`.
pub fn find(db: &Database, ngo_id: &str, month: &str) -> Result<Option<ReportRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM reports WHERE ngo_id = ?1 AND month = ?2")?;
        let mut rows = stmt.query_map(params![ngo_id, month], ReportRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Returns all reports, newest first.
pub fn list_all(db: &Database) -> Result<Vec<ReportRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt =
            conn.prepare("SELECT * FROM reports ORDER BY created_at DESC, id DESC")?;
        let rows: Vec<ReportRow> = stmt
            .query_map([], ReportRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
