use axum::{
    extract::State,
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tracing::{debug, warn};

use crate::auth::AppState;
use crate::error::ApiError;

pub const PROXY_TOKEN_HEADER: &str = "x-proxy-token";

/// Largest classification payload accepted by the relay.
pub const RELAY_BODY_LIMIT: usize = 32 * 1024 * 1024;

/// POST /api/openrouter — forwards a chat-completion payload upstream with the
/// server's credential and hands back the upstream status and body untouched.
pub async fn relay(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let relay = &state.config.relay;

    if let Some(expected) = relay.proxy_token.as_deref() {
        let provided = headers
            .get(PROXY_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if provided != expected {
            warn!("Relay request with invalid proxy token");
            return Err(ApiError::Unauthorized("Invalid proxy token".into()));
        }
    }

    let api_key = relay
        .api_key
        .as_deref()
        .ok_or_else(|| ApiError::Misconfigured("upstream API key is not configured on server".into()))?;

    serde_json::from_slice::<serde_json::Value>(&body)
        .map_err(|_| ApiError::bad_request("Invalid JSON body"))?;

    let upstream = state
        .http
        .post(&relay.api_url)
        .bearer_auth(api_key)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await
        .map_err(|e| ApiError::BadGateway(format!("Upstream request failed: {}", e)))?;

    let status = upstream.status();
    let content = upstream
        .bytes()
        .await
        .map_err(|e| ApiError::BadGateway(format!("Upstream body read failed: {}", e)))?;

    debug!("Relayed classification request: upstream {} ({} bytes)", status, content.len());
    Ok((status, [(header::CONTENT_TYPE, "application/json")], content).into_response())
}
