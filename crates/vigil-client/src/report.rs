use std::time::Duration;

use chrono::Local;
use tracing::{info, warn};

use vigil_types::api::LogEntryRequest;
use vigil_types::models::LogStatus;

const REPORT_TIMEOUT: Duration = Duration::from_secs(5);

/// Posts verdicts to the server's `/api/log`. Delivery is best effort.
pub struct Reporter {
    http: reqwest::Client,
    url: String,
}

impl Reporter {
    pub fn new(url: String) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REPORT_TIMEOUT)
            .no_proxy()
            .build()?;
        Ok(Self { http, url })
    }

    /// Returns whether the server acknowledged the report.
    pub async fn send(&self, status: LogStatus, details: Option<String>) -> bool {
        let entry = LogEntryRequest {
            timestamp: Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            status,
            details,
        };

        match self.http.post(&self.url).json(&entry).send().await {
            Ok(response) if response.status().is_success() => {
                info!("Report sent to server: {}", status);
                true
            }
            Ok(response) => {
                warn!("Server rejected report: {}", response.status());
                false
            }
            Err(e) => {
                warn!("Failed to send report to server: {}", e);
                false
            }
        }
    }
}
