use tracing::info;

use vigil_client::capture::{self, ScreenSource};
use vigil_client::config::{ClientConfig, Route};
use vigil_client::heartbeat::{self, HEARTBEAT_FILE, HEARTBEAT_INTERVAL};
use vigil_client::instance::single_instance;
use vigil_client::logging::enable_logging;
use vigil_client::monitor::Monitor;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let config = ClientConfig::from_env()?;
    std::fs::create_dir_all(&config.data_dir)?;
    enable_logging(&config.data_dir)?;

    let Some(_instance) = single_instance(config.instance_port) else {
        return Ok(());
    };

    info!("=== Vigil client started ===");
    info!(
        "Config: interval={}min, route={}, server={}, model={}",
        config.interval.as_secs() / 60,
        match &config.route {
            Route::Relay { .. } => "relay",
            Route::Direct { .. } => "direct",
        },
        config.server_url,
        config.model,
    );

    tokio::spawn(heartbeat::run(config.data_dir.join(HEARTBEAT_FILE), HEARTBEAT_INTERVAL));

    let source = capture::default_source();
    info!("Screen capture backend: {}", source.backend());
    let monitor = Monitor::new(source, &config)?;

    tokio::select! {
        _ = monitor.run(config.interval) => {}
        _ = tokio::signal::ctrl_c() => info!("Received Ctrl+C, stopping"),
    }

    Ok(())
}
