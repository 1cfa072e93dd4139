use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use tracing::warn;

use vigil_types::models::{LogRecord, LogStatus};

use crate::models::LogRow;
use crate::Database;

/// Storage format for every timestamp column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .with_context(|| format!("invalid stored timestamp '{}'", s))
}

impl Database {
    // -- Logs --

    pub fn insert_log(&self, record: &LogRecord) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO logs (id, timestamp, status, details, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    record.id.to_string(),
                    format_timestamp(&record.timestamp),
                    record.status.as_str(),
                    record.details,
                    format_timestamp(&record.created_at),
                ],
            )?;
            Ok(())
        })
    }

    /// Timestamp of the most recent report, by reported time.
    pub fn latest_timestamp(&self) -> Result<Option<NaiveDateTime>> {
        self.with_conn(|conn| {
            let latest: Option<String> = conn
                .query_row("SELECT MAX(timestamp) FROM logs", [], |row| row.get(0))?;
            latest.as_deref().map(parse_timestamp).transpose()
        })
    }

    /// Records with `start <= timestamp < end`, oldest first.
    pub fn logs_between(&self, start: NaiveDateTime, end: NaiveDateTime) -> Result<Vec<LogRecord>> {
        self.with_conn(|conn| query_logs_between(conn, &start, &end))?
            .into_iter()
            .map(LogRecord::try_from_row)
            .collect()
    }

    pub fn count_logs(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM logs", [], |row| row.get(0))?;
            Ok(count as u64)
        })
    }
}

fn query_logs_between(
    conn: &Connection,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> Result<Vec<LogRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, timestamp, status, details, created_at
         FROM logs
         WHERE timestamp >= ?1 AND timestamp < ?2
         ORDER BY timestamp ASC",
    )?;

    let rows = stmt
        .query_map(
            rusqlite::params![format_timestamp(start), format_timestamp(end)],
            |row| {
                Ok(LogRow {
                    id: row.get(0)?,
                    timestamp: row.get(1)?,
                    status: row.get(2)?,
                    details: row.get(3)?,
                    created_at: row.get(4)?,
                })
            },
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

trait FromRow: Sized {
    fn try_from_row(row: LogRow) -> Result<Self>;
}

impl FromRow for LogRecord {
    fn try_from_row(row: LogRow) -> Result<Self> {
        let status = LogStatus::parse(&row.status).unwrap_or_else(|| {
            warn!("Unknown status '{}' on log '{}', counting as error", row.status, row.id);
            LogStatus::Error
        });

        Ok(LogRecord {
            id: row
                .id
                .parse()
                .with_context(|| format!("corrupt log id '{}'", row.id))?,
            timestamp: parse_timestamp(&row.timestamp)?,
            status,
            details: row.details,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}
