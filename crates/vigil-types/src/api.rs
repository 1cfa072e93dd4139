use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{BucketStatus, LogStatus};

// -- Session --

/// Session token claims. The token lives only in the `session_token` cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

// -- Ingestion --

/// Report posted by the capture client to `/api/log`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntryRequest {
    pub timestamp: String,
    pub status: LogStatus,
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogEntryResponse {
    pub status: String,
    pub id: Uuid,
}

// -- Calendar --

#[derive(Debug, Serialize, Deserialize)]
pub struct MonthSummary {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub days_in_month: u32,
    /// Weekday of the 1st, 0 = Saturday.
    pub first_weekday: u32,
    pub days: BTreeMap<u32, BucketStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DaySummary {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub month_name: String,
    pub hours: BTreeMap<u32, HourSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HourSummary {
    pub status: BucketStatus,
    pub count: usize,
    pub logs: Vec<LogLine>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogLine {
    pub time: String,
    pub status: LogStatus,
    pub details: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LastUpdate {
    pub has_data: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jalali: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CurrentDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
