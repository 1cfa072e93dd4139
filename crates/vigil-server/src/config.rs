use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use vigil_api::config::{ApiConfig, DEFAULT_UPSTREAM_URL, RelayConfig};

/// Session keys that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-this-secret-key-in-production",
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub api: ApiConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds and validates the configuration from a variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or_default = |key: &str, default: &str| non_empty(key).unwrap_or_else(|| default.to_string());

        let host = or_default("VIGIL_HOST", "0.0.0.0");
        let port: u16 = or_default("VIGIL_PORT", "8000")
            .parse()
            .context("VIGIL_PORT must be a port number")?;
        let ip: IpAddr = host
            .parse()
            .with_context(|| format!("VIGIL_HOST '{}' is not an IP address", host))?;
        let addr = SocketAddr::new(ip, port);

        let username = non_empty("APP_USERNAME").context("APP_USERNAME must be set")?;
        let password = non_empty("APP_PASSWORD").context("APP_PASSWORD must be set")?;

        let session_secret = non_empty("SECRET_KEY").unwrap_or_default();
        if session_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&session_secret.as_str()) {
            bail!("SECRET_KEY is unset or still a placeholder");
        }

        let session_hours: i64 = or_default("SESSION_EXPIRE_HOURS", "24")
            .parse()
            .context("SESSION_EXPIRE_HOURS must be an integer")?;
        if session_hours <= 0 {
            bail!("SESSION_EXPIRE_HOURS must be positive");
        }

        let cookie_secure = matches!(
            or_default("VIGIL_COOKIE_SECURE", "false").to_ascii_lowercase().as_str(),
            "true" | "1" | "yes"
        );

        let relay = RelayConfig {
            api_key: non_empty("OPENROUTER_API_KEY"),
            api_url: or_default("OPENROUTER_API_URL", DEFAULT_UPSTREAM_URL),
            outbound_proxy: non_empty("OPENROUTER_SOCKS5_PROXY"),
            proxy_token: non_empty("OPENROUTER_PROXY_TOKEN"),
        };

        Ok(Self {
            addr,
            db_path: or_default("VIGIL_DB_PATH", "vigil.db").into(),
            api: ApiConfig {
                username,
                password,
                session_secret,
                session_hours,
                cookie_secure,
                relay,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("APP_USERNAME", "admin"),
        ("APP_PASSWORD", "pw"),
        ("SECRET_KEY", "a-real-secret"),
    ];

    #[test]
    fn defaults_apply() {
        let config = load(REQUIRED).unwrap();
        assert_eq!(config.addr.port(), 8000);
        assert_eq!(config.db_path, PathBuf::from("vigil.db"));
        assert_eq!(config.api.session_hours, 24);
        assert_eq!(config.api.relay.api_url, DEFAULT_UPSTREAM_URL);
        assert!(config.api.relay.api_key.is_none());
        assert!(config.api.relay.proxy_token.is_none());
        assert!(!config.api.cookie_secure);
    }

    #[test]
    fn placeholder_secret_is_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars[2] = ("SECRET_KEY", "change-this-secret-key-in-production");
        assert!(load(&vars).is_err());
        assert!(load(&REQUIRED[..2]).is_err());
    }

    #[test]
    fn ipv6_host_is_accepted() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([("VIGIL_HOST", "::"), ("VIGIL_PORT", "8080")]);
        let config = load(&vars).unwrap();
        assert!(config.addr.is_ipv6());
        assert_eq!(config.addr.to_string(), "[::]:8080");

        let mut vars = REQUIRED.to_vec();
        vars.push(("VIGIL_HOST", "not-an-ip"));
        assert!(load(&vars).is_err());
    }

    #[test]
    fn missing_credentials_are_rejected() {
        assert!(load(&REQUIRED[1..]).is_err());
    }

    #[test]
    fn relay_settings_are_read() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("OPENROUTER_API_KEY", "sk-1"),
            ("OPENROUTER_PROXY_TOKEN", "tok"),
            ("OPENROUTER_SOCKS5_PROXY", "socks5://127.0.0.1:1080"),
            ("VIGIL_PORT", "9001"),
        ]);
        let config = load(&vars).unwrap();
        assert_eq!(config.addr.port(), 9001);
        assert_eq!(config.api.relay.api_key.as_deref(), Some("sk-1"));
        assert_eq!(config.api.relay.proxy_token.as_deref(), Some("tok"));
        assert_eq!(config.api.relay.outbound_proxy.as_deref(), Some("socks5://127.0.0.1:1080"));
    }
}
