use axum::{Json, extract::State};
use chrono::{DateTime, Local, NaiveDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use vigil_types::api::{LogEntryRequest, LogEntryResponse};
use vigil_types::models::LogRecord;

use crate::auth::AppState;
use crate::error::{ApiError, blocking};

/// Reads a client-reported timestamp as local wall-clock time.
///
/// Offset-aware values are converted to the server's zone; naive values are
/// taken as-is.
pub fn parse_reported_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    raw.parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

/// POST /api/log — unauthenticated ingestion of a client verdict.
pub async fn receive_log(
    State(state): State<AppState>,
    Json(req): Json<LogEntryRequest>,
) -> Result<Json<LogEntryResponse>, ApiError> {
    let now = Local::now().naive_local();
    let timestamp = parse_reported_timestamp(&req.timestamp).unwrap_or_else(|| {
        warn!("Unparseable timestamp '{}', using server time", req.timestamp);
        now
    });

    let record = LogRecord {
        id: Uuid::new_v4(),
        timestamp,
        status: req.status,
        details: req.details,
        created_at: now,
    };
    let id = record.id;
    let status = record.status;

    blocking(move || state.db.insert_log(&record)).await?;

    info!("Stored {} report {} at {}", status, id, timestamp);
    Ok(Json(LogEntryResponse {
        status: "ok".into(),
        id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn naive(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 21)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn naive_iso_is_kept_verbatim() {
        assert_eq!(parse_reported_timestamp("2025-03-21T10:15:30"), Some(naive(10, 15, 30)));
        assert_eq!(
            parse_reported_timestamp("2025-03-21T10:15:30.123456").map(|t| t.format("%H:%M:%S%.6f").to_string()),
            Some("10:15:30.123456".into())
        );
        assert_eq!(parse_reported_timestamp("2025-03-21 10:15:30"), Some(naive(10, 15, 30)));
    }

    #[test]
    fn offset_timestamps_are_accepted() {
        assert!(parse_reported_timestamp("2025-03-21T10:15:30Z").is_some());
        assert!(parse_reported_timestamp("2025-03-21T10:15:30+03:30").is_some());
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(parse_reported_timestamp("yesterday"), None);
        assert_eq!(parse_reported_timestamp(""), None);
    }
}
