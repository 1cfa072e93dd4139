mod config;

use tower_http::trace::TraceLayer;
use tracing::info;

use vigil_api::AppStateInner;
use vigil_db::Database;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vigil=debug,vigil_api=debug,vigil_db=info,tower_http=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let db = Database::open(&config.db_path)?;
    info!(
        "Relay: upstream {} (key {}, proxy token {}, outbound proxy {})",
        config.api.relay.api_url,
        if config.api.relay.api_key.is_some() { "set" } else { "missing" },
        if config.api.relay.proxy_token.is_some() { "required" } else { "off" },
        config.api.relay.outbound_proxy.as_deref().unwrap_or("none"),
    );

    let state = AppStateInner::new(db, config.api.clone())?;
    let app = vigil_api::router(state).layer(TraceLayer::new_for_http());

    info!("Vigil server listening on {}", config.addr);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;

    // The router owns the only state handle, so the database closes when serving ends.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
