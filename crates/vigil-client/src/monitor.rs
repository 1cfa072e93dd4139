use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};
use tracing::{info, warn};

use vigil_types::models::LogStatus;

use crate::alerts::AlertLog;
use crate::capture::{ScreenSource, encode_capture};
use crate::classify::{Classifier, build_request, is_flagged};
use crate::config::{ClientConfig, ImageBounds};
use crate::error::ClientError;
use crate::report::Reporter;

/// Result of one capture cycle, as reported to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: LogStatus,
    pub details: String,
}

/// Fires immediately, then once per `period`. After an overrun the next tick
/// fires at once and the schedule restarts from there; missed ticks are not replayed.
pub fn cycle_ticker(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Capture → classify → report pipeline.
pub struct Monitor {
    source: Arc<Mutex<dyn ScreenSource>>,
    classifier: Classifier,
    reporter: Reporter,
    alerts: Option<AlertLog>,
    bounds: ImageBounds,
    model: String,
}

impl Monitor {
    pub fn new<S: ScreenSource + 'static>(source: S, config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            source: Arc::new(Mutex::new(source)),
            classifier: Classifier::new(config.route.clone())?,
            reporter: Reporter::new(config.log_url())?,
            alerts: Some(AlertLog::new(&config.data_dir, config.keep_flagged)),
            bounds: config.bounds,
            model: config.model.clone(),
        })
    }

    /// Skips the local alert trail.
    pub fn without_alerts(mut self) -> Self {
        self.alerts = None;
        self
    }

    /// Grabs and encodes a frame on the blocking pool.
    async fn capture_jpeg(&self) -> Result<Vec<u8>, ClientError> {
        let source = Arc::clone(&self.source);
        let bounds = self.bounds;
        tokio::task::spawn_blocking(move || {
            let frame = source
                .lock()
                .map_err(|e| ClientError::Worker(format!("screen source lock poisoned: {}", e)))?
                .capture()?;
            encode_capture(frame, &bounds)
        })
        .await
        .map_err(|e| ClientError::Worker(e.to_string()))?
    }

    async fn check(&self) -> Result<(bool, String, Vec<u8>), ClientError> {
        let jpeg = self.capture_jpeg().await?;
        let request = build_request(&self.model, &jpeg);
        let answer = self.classifier.classify(&request).await?;
        Ok((is_flagged(&answer), answer, jpeg))
    }

    /// One full cycle. Never fails: any error becomes an `error` verdict.
    pub async fn run_cycle(&self) -> Verdict {
        let verdict = match self.check().await {
            Ok((true, answer, jpeg)) => {
                warn!("Flagged content detected (model said '{}')", answer.trim());
                if let Some(alerts) = &self.alerts {
                    match alerts.record(&jpeg, &answer).await {
                        Ok(Some(path)) => info!("Flagged capture saved to {}", path.display()),
                        Ok(None) => {}
                        Err(e) => warn!("Failed to record alert: {}", e),
                    }
                }
                Verdict {
                    status: LogStatus::Nsfw,
                    details: answer,
                }
            }
            Ok((false, answer, _)) => {
                info!("Content check: safe");
                Verdict {
                    status: LogStatus::Safe,
                    details: answer,
                }
            }
            Err(e) => {
                warn!("Content check failed: {}", e);
                Verdict {
                    status: LogStatus::Error,
                    details: e.to_string(),
                }
            }
        };

        self.reporter
            .send(verdict.status, Some(verdict.details.clone()))
            .await;
        verdict
    }

    /// Runs a cycle immediately and then once per `interval`. Cycles never overlap;
    /// a slow cycle delays the next tick instead of bunching them up.
    pub async fn run(self, interval: Duration) {
        let mut ticker = cycle_ticker(interval);

        loop {
            ticker.tick().await;
            self.run_cycle().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use image::RgbaImage;
    use tokio::time::Instant;

    #[derive(Default)]
    struct Counters {
        captures: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    struct CountingScreen(Arc<Counters>);

    impl ScreenSource for CountingScreen {
        fn capture(&mut self) -> Result<RgbaImage, ClientError> {
            let now = self.0.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.0.max_in_flight.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(5));
            self.0.captures.fetch_add(1, Ordering::SeqCst);
            self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(RgbaImage::new(8, 8))
        }
    }

    fn offline_config(dir: &std::path::Path) -> ClientConfig {
        let data_dir = dir.to_string_lossy().into_owned();
        let vars = [
            ("ACC_SERVER_URL", "http://127.0.0.1:9"),
            ("ACC_USE_SERVER_PROXY", "false"),
            ("ACC_DATA_DIR", data_dir.as_str()),
        ];
        ClientConfig::from_lookup(|key| {
            vars.iter().find(|(k, _)| *k == key).map(|(_, v)| v.to_string())
        })
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn first_capture_is_immediate_and_cycles_run_one_at_a_time() {
        let dir = tempfile::tempdir().unwrap();
        let counters = Arc::new(Counters::default());
        let monitor = Monitor::new(CountingScreen(counters.clone()), &offline_config(dir.path()))
            .unwrap()
            .without_alerts();

        let period = Duration::from_secs(60);
        let start = Instant::now();
        let task = tokio::spawn(monitor.run(period));
        let captures = || counters.captures.load(Ordering::SeqCst);

        tokio::time::sleep_until(start + Duration::from_secs(1)).await;
        assert_eq!(captures(), 1);

        tokio::time::sleep_until(start + Duration::from_secs(59)).await;
        assert_eq!(captures(), 1);

        tokio::time::sleep_until(start + Duration::from_secs(61)).await;
        assert_eq!(captures(), 2);

        tokio::time::sleep_until(start + Duration::from_secs(301)).await;
        assert_eq!(captures(), 6);
        assert_eq!(counters.max_in_flight.load(Ordering::SeqCst), 1);

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn overrun_delays_the_next_tick_instead_of_bursting() {
        let start = Instant::now();
        let mut ticker = cycle_ticker(Duration::from_secs(60));

        ticker.tick().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        // a cycle that runs for two and a half periods
        tokio::time::sleep(Duration::from_secs(150)).await;

        ticker.tick().await;
        assert_eq!(start.elapsed(), Duration::from_secs(150));
        ticker.tick().await;
        assert_eq!(start.elapsed(), Duration::from_secs(210));
    }
}
