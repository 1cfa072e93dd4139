use std::sync::Arc;
use std::time::Duration;

use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{info, warn};

use vigil_db::Database;
use vigil_types::api::{Claims, LoginForm};

use crate::config::ApiConfig;
use crate::views;

pub const SESSION_COOKIE: &str = "session_token";

const RELAY_TIMEOUT: Duration = Duration::from_secs(60);

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub config: ApiConfig,
    pub http: reqwest::Client,
}

impl AppStateInner {
    pub fn new(db: Database, config: ApiConfig) -> anyhow::Result<AppState> {
        let mut builder = reqwest::Client::builder().timeout(RELAY_TIMEOUT);
        // Only the configured proxy applies; ambient HTTP(S)_PROXY variables are ignored.
        builder = match &config.relay.outbound_proxy {
            Some(proxy) => builder.proxy(reqwest::Proxy::all(proxy)?),
            None => builder.no_proxy(),
        };

        Ok(Arc::new(Self {
            db,
            config,
            http: builder.build()?,
        }))
    }
}

pub fn create_token(secret: &str, username: &str, hours: i64) -> anyhow::Result<String> {
    let claims = Claims {
        sub: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::hours(hours)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Returns the claims of a valid, unexpired token.
pub fn verify_token(secret: &str, token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

/// Claims carried by the session cookie, if any.
pub fn session_claims(state: &AppStateInner, jar: &CookieJar) -> Option<Claims> {
    let token = jar.get(SESSION_COOKIE)?;
    verify_token(&state.config.session_secret, token.value())
}

fn credentials_match(config: &ApiConfig, form: &LoginForm) -> bool {
    form.username == config.username && form.password == config.password
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    if !credentials_match(&state.config, &form) {
        warn!("Failed login attempt for '{}'", form.username);
        return views::login_form(Some(views::LOGIN_FAILED));
    }

    let token = match create_token(&state.config.session_secret, &form.username, state.config.session_hours) {
        Ok(token) => token,
        Err(e) => return crate::error::ApiError::Internal(e).into_response(),
    };

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.cookie_secure)
        .max_age(time::Duration::hours(state.config.session_hours));

    info!("User '{}' logged in", form.username);
    (jar.add(cookie), views::found("/calendar")).into_response()
}

/// GET /logout
pub async fn logout(jar: CookieJar) -> Response {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, views::found("/login")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let token = create_token("secret", "admin", 24).unwrap();
        let claims = verify_token("secret", &token).unwrap();
        assert_eq!(claims.sub, "admin");
    }

    #[test]
    fn token_with_wrong_key_is_rejected() {
        let token = create_token("secret", "admin", 24).unwrap();
        assert!(verify_token("other", &token).is_none());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = create_token("secret", "admin", -2).unwrap();
        assert!(verify_token("secret", &token).is_none());
    }
}
