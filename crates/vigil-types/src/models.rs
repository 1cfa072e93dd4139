use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Verdict reported by the capture client for one screenshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Safe,
    Nsfw,
    Error,
}

impl LogStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LogStatus::Safe => "safe",
            LogStatus::Nsfw => "nsfw",
            LogStatus::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "safe" => Some(LogStatus::Safe),
            "nsfw" => Some(LogStatus::Nsfw),
            "error" => Some(LogStatus::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for LogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary status of a calendar bucket (a day or an hour).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketStatus {
    Nsfw,
    Safe,
    Error,
    NoData,
}

/// Per-status tallies for one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub safe: usize,
    pub nsfw: usize,
    pub error: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: LogStatus) {
        match status {
            LogStatus::Safe => self.safe += 1,
            LogStatus::Nsfw => self.nsfw += 1,
            LogStatus::Error => self.error += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.safe + self.nsfw + self.error
    }

    /// Precedence is nsfw > safe > error > no_data.
    pub fn status(&self) -> BucketStatus {
        if self.nsfw > 0 {
            BucketStatus::Nsfw
        } else if self.safe > 0 {
            BucketStatus::Safe
        } else if self.error > 0 {
            BucketStatus::Error
        } else {
            BucketStatus::NoData
        }
    }
}

impl FromIterator<LogStatus> for StatusCounts {
    fn from_iter<I: IntoIterator<Item = LogStatus>>(iter: I) -> Self {
        let mut counts = StatusCounts::default();
        for status in iter {
            counts.record(status);
        }
        counts
    }
}

/// A stored verdict. Timestamps are wall-clock times as reported by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub id: Uuid,
    pub timestamp: NaiveDateTime,
    pub status: LogStatus,
    pub details: Option<String>,
    pub created_at: NaiveDateTime,
}
