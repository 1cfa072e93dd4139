use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::warn;

pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
pub const HEARTBEAT_FILE: &str = "heartbeat.txt";

/// Overwrites the heartbeat file with the current Unix time in seconds.
pub async fn beat(path: &Path) -> std::io::Result<()> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64();
    tokio::fs::write(path, now.to_string()).await
}

/// Liveness loop, independent of the capture loop. Write failures are logged and skipped.
pub async fn run(path: PathBuf, every: Duration) {
    let mut interval = tokio::time::interval(every);
    // first tick completes immediately; the first write lands one period in
    interval.tick().await;

    loop {
        interval.tick().await;
        if let Err(e) = beat(&path).await {
            warn!("Heartbeat write to {} failed: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn beat_writes_a_recent_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HEARTBEAT_FILE);
        beat(&path).await.unwrap();
        beat(&path).await.unwrap();

        let written: f64 = std::fs::read_to_string(&path).unwrap().parse().unwrap();
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs_f64();
        assert!(now - written < 60.0);
    }

    #[tokio::test(start_paused = true)]
    async fn loop_keeps_beating_after_a_failed_write() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("not-yet");
        let path = missing.join(HEARTBEAT_FILE);

        let start = tokio::time::Instant::now();
        let task = tokio::spawn(run(path.clone(), HEARTBEAT_INTERVAL));

        // nothing is written before the first period
        tokio::time::sleep_until(start + Duration::from_secs(1)).await;
        assert!(!path.exists());

        // first beat fails: the directory does not exist yet
        tokio::time::sleep_until(start + HEARTBEAT_INTERVAL + Duration::from_secs(1)).await;
        assert!(!path.exists());
        assert!(!task.is_finished());

        std::fs::create_dir(&missing).unwrap();
        tokio::time::sleep_until(start + HEARTBEAT_INTERVAL * 2 + Duration::from_secs(1)).await;
        let written: f64 = std::fs::read_to_string(&path).unwrap().parse().unwrap();
        assert!(written > 0.0);

        task.abort();
    }
}
