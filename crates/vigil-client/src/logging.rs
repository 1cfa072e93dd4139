use std::path::Path;

use anyhow::Result;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Logs to stdout and to daily files under `<data_dir>/logs`.
pub fn enable_logging(data_dir: &Path) -> Result<()> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(7)
        .filename_prefix("client")
        .filename_suffix("log")
        .build(data_dir.join("logs"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vigil_client=info".into()),
        )
        .with_ansi(false)
        .with_writer(std::io::stdout.and(appender))
        .init();
    Ok(())
}
