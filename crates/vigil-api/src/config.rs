/// Settings the HTTP layer needs, validated by the binary before the router is built.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub username: String,
    pub password: String,
    pub session_secret: String,
    pub session_hours: i64,
    pub cookie_secure: bool,
    pub relay: RelayConfig,
}

/// Upstream classification API the relay forwards to.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    /// Outbound proxy URL, e.g. `socks5://host:port`.
    pub outbound_proxy: Option<String>,
    /// Shared secret clients must send in `X-Proxy-Token`.
    pub proxy_token: Option<String>,
}

pub const DEFAULT_UPSTREAM_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
