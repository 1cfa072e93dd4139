use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use vigil_types::api::{CurrentDate, DaySummary, HourSummary, LastUpdate, LogLine, MonthSummary};
use vigil_types::jalali::{self, JalaliDate};
use vigil_types::models::{LogRecord, StatusCounts};

use crate::auth::AppState;
use crate::error::{ApiError, blocking};

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Buckets a month's records by Jalali day; every day of the month is present.
pub fn summarize_month(
    year: i32,
    month: u32,
    first_day: NaiveDate,
    records: &[LogRecord],
) -> Option<MonthSummary> {
    let days_in_month = jalali::days_in_month(year, month)?;
    let first = JalaliDate::new(year, month, 1)?;

    let mut counts = vec![StatusCounts::default(); days_in_month as usize];
    for record in records {
        let offset = (record.timestamp.date() - first_day).num_days();
        if let Some(bucket) = usize::try_from(offset).ok().and_then(|i| counts.get_mut(i)) {
            bucket.record(record.status);
        }
    }

    let days: BTreeMap<u32, _> = (1..=days_in_month)
        .zip(counts.iter().map(StatusCounts::status))
        .collect();

    Some(MonthSummary {
        year,
        month,
        month_name: first.month_name().to_string(),
        days_in_month,
        first_weekday: first.weekday_offset()?,
        days,
    })
}

/// Buckets one day's records by hour; all 24 hours are present.
pub fn summarize_day(date: JalaliDate, records: &[LogRecord]) -> DaySummary {
    let mut hours: BTreeMap<u32, (StatusCounts, Vec<LogLine>)> =
        (0..24).map(|h| (h, Default::default())).collect();

    for record in records {
        if let Some((counts, logs)) = hours.get_mut(&record.timestamp.hour()) {
            counts.record(record.status);
            logs.push(LogLine {
                time: record.timestamp.format("%H:%M:%S").to_string(),
                status: record.status,
                details: record.details.clone(),
            });
        }
    }

    DaySummary {
        year: date.year,
        month: date.month,
        day: date.day,
        month_name: date.month_name().to_string(),
        hours: hours
            .into_iter()
            .map(|(hour, (counts, logs))| {
                (
                    hour,
                    HourSummary {
                        status: counts.status(),
                        count: counts.total(),
                        logs,
                    },
                )
            })
            .collect(),
    }
}

/// GET /api/month/{year}/{month}
pub async fn month(
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
) -> Result<Json<MonthSummary>, ApiError> {
    if !(1..=12).contains(&month) {
        return Err(ApiError::bad_request("Invalid month"));
    }
    let (start, end) =
        jalali::month_range(year, month).ok_or_else(|| ApiError::bad_request("Invalid year"))?;

    let records = blocking(move || state.db.logs_between(midnight(start), midnight(end))).await?;

    summarize_month(year, month, start, &records)
        .map(Json)
        .ok_or_else(|| ApiError::bad_request("Invalid year"))
}

/// GET /api/day/{year}/{month}/{day}
pub async fn day(
    State(state): State<AppState>,
    Path((year, month, day)): Path<(i32, u32, u32)>,
) -> Result<Json<DaySummary>, ApiError> {
    if !(1..=12).contains(&month) {
        return Err(ApiError::bad_request("Invalid month"));
    }
    let date = JalaliDate::new(year, month, day).ok_or_else(|| ApiError::bad_request("Invalid day"))?;
    let start = date
        .to_gregorian()
        .ok_or_else(|| ApiError::bad_request("Invalid year"))?;
    let end = start
        .succ_opt()
        .ok_or_else(|| ApiError::bad_request("Invalid year"))?;

    let records = blocking(move || state.db.logs_between(midnight(start), midnight(end))).await?;

    Ok(Json(summarize_day(date, &records)))
}

/// GET /api/last-update
pub async fn last_update(State(state): State<AppState>) -> Result<Json<LastUpdate>, ApiError> {
    let latest = blocking(move || state.db.latest_timestamp()).await?;

    let Some(ts) = latest else {
        return Ok(Json(LastUpdate {
            has_data: false,
            timestamp: None,
            jalali: None,
        }));
    };

    let jalali = JalaliDate::from_gregorian(ts.date())
        .map(|date| format!("{} {}", date, ts.format("%H:%M:%S")));

    Ok(Json(LastUpdate {
        has_data: true,
        timestamp: Some(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
        jalali,
    }))
}

/// GET /api/current-date
pub async fn current_date() -> Result<Json<CurrentDate>, ApiError> {
    let today = today()?;
    Ok(Json(CurrentDate {
        year: today.year,
        month: today.month,
        day: today.day,
    }))
}

pub fn today() -> Result<JalaliDate, ApiError> {
    JalaliDate::from_gregorian(Local::now().date_naive())
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("current date outside the Jalali range")))
}
