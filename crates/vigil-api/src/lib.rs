pub mod auth;
pub mod calendar;
pub mod config;
pub mod error;
pub mod logs;
pub mod middleware;
pub mod relay;
pub mod views;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use serde_json::{Value, json};

pub use auth::{AppState, AppStateInner};

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Full HTTP surface: ingestion, relay, session-gated API and pages.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/log", post(logs::receive_log))
        .route(
            "/api/openrouter",
            post(relay::relay).layer(DefaultBodyLimit::max(relay::RELAY_BODY_LIMIT)),
        )
        .route("/login", get(views::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/static/calendar.js", get(views::calendar_js))
        .route("/static/style.css", get(views::style_css))
        .route("/health", get(health));

    let api_routes = Router::new()
        .route("/api/month/{year}/{month}", get(calendar::month))
        .route("/api/day/{year}/{month}/{day}", get(calendar::day))
        .route("/api/last-update", get(calendar::last_update))
        .route("/api/current-date", get(calendar::current_date))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_session));

    let page_routes = Router::new()
        .route("/", get(views::index))
        .route("/calendar", get(views::calendar_page))
        .route("/day/{year}/{month}/{day}", get(views::day_page))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_session_page));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .merge(page_routes)
        .with_state(state)
}
