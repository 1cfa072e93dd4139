use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::{AppState, session_claims};
use crate::error::ApiError;
use crate::views;

/// Rejects API requests without a valid session cookie.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = session_claims(&state, &jar)
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".into()))?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Sends browsers without a valid session cookie to the login form.
pub async fn require_session_page(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    match session_claims(&state, &jar) {
        Some(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        None => views::found("/login").into_response(),
    }
}
