use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tokio::io::AsyncWriteExt;

/// Local trail of flagged captures under the data directory.
pub struct AlertLog {
    dir: PathBuf,
    keep_captures: bool,
}

impl AlertLog {
    pub fn new(dir: &Path, keep_captures: bool) -> Self {
        Self {
            dir: dir.to_path_buf(),
            keep_captures,
        }
    }

    /// Appends to `nsfw_alerts.txt` and, if enabled, saves the capture under
    /// `flagged/`. Returns the saved capture path.
    pub async fn record(&self, jpeg: &[u8], answer: &str) -> std::io::Result<Option<PathBuf>> {
        let now = Local::now();

        let saved = if self.keep_captures {
            let flagged = self.dir.join("flagged");
            tokio::fs::create_dir_all(&flagged).await?;
            Some(save_capture(&flagged, &now, jpeg).await?)
        } else {
            None
        };

        let line = format!(
            "[{}] NSFW DETECTED: {} | Result: {}\n",
            now.format("%Y-%m-%d %H:%M:%S"),
            saved
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(capture not kept)".into()),
            answer.trim(),
        );
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join("nsfw_alerts.txt"))
            .await?;
        file.write_all(line.as_bytes()).await?;
        // tokio files write in the background until flushed
        file.flush().await?;

        Ok(saved)
    }
}

/// Writes the capture under a fresh name; same-millisecond captures get a
/// numeric suffix instead of replacing each other.
async fn save_capture(dir: &Path, now: &DateTime<Local>, jpeg: &[u8]) -> std::io::Result<PathBuf> {
    let stem = format!("capture_{}", now.format("%Y-%m-%d_%H-%M-%S_%3f"));
    let mut attempt = 0u32;
    loop {
        let name = match attempt {
            0 => format!("{}.jpg", stem),
            n => format!("{}-{}.jpg", stem, n),
        };
        let path = dir.join(name);
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(mut file) => {
                file.write_all(jpeg).await?;
                file.flush().await?;
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn flagged_capture_is_saved_and_logged() {
        let dir = tempfile::tempdir().unwrap();
        let alerts = AlertLog::new(dir.path(), true);

        let saved = alerts.record(b"jpeg-bytes", "YES").await.unwrap().unwrap();
        assert_eq!(std::fs::read(&saved).unwrap(), b"jpeg-bytes");
        assert!(saved.starts_with(dir.path().join("flagged")));

        alerts.record(b"more", " YES\n").await.unwrap();
        let log = std::fs::read_to_string(dir.path().join("nsfw_alerts.txt")).unwrap();
        assert_eq!(log.lines().count(), 2);
        assert!(log.lines().all(|l| l.ends_with("Result: YES")));
    }

    #[tokio::test]
    async fn every_record_is_on_disk_when_it_returns() {
        let dir = tempfile::tempdir().unwrap();
        let alerts = AlertLog::new(dir.path(), false);

        for expected in 1..=50 {
            alerts.record(b"x", "YES").await.unwrap();
            let log = std::fs::read_to_string(dir.path().join("nsfw_alerts.txt")).unwrap();
            assert_eq!(log.lines().count(), expected);
        }
    }

    #[tokio::test]
    async fn captures_in_the_same_instant_are_all_kept() {
        let dir = tempfile::tempdir().unwrap();
        let now = Local::now();

        let first = save_capture(dir.path(), &now, b"one").await.unwrap();
        let second = save_capture(dir.path(), &now, b"two").await.unwrap();
        let third = save_capture(dir.path(), &now, b"three").await.unwrap();

        assert_ne!(first, second);
        assert!(second.to_string_lossy().ends_with("-1.jpg"));
        assert!(third.to_string_lossy().ends_with("-2.jpg"));
        assert_eq!(std::fs::read(&first).unwrap(), b"one");
        assert_eq!(std::fs::read(&third).unwrap(), b"three");
    }

    #[tokio::test]
    async fn captures_can_be_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let alerts = AlertLog::new(dir.path(), false);
        assert!(alerts.record(b"x", "YES").await.unwrap().is_none());
        assert!(!dir.path().join("flagged").exists());
        assert!(dir.path().join("nsfw_alerts.txt").exists());
    }
}
