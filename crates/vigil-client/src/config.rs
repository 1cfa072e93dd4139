use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

pub const DEFAULT_MODEL: &str = "google/gemma-3-4b-it:free";
pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_INSTANCE_PORT: u16 = 59123;

/// Where classification requests go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Through the server's `/api/openrouter` relay.
    Relay { url: String, token: Option<String> },
    /// Straight to the upstream API with a client-held key.
    Direct {
        url: String,
        api_key: Option<String>,
        proxy: Option<String>,
    },
}

/// Bounds applied to every capture before upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageBounds {
    pub max_width: u32,
    pub max_height: u32,
    pub jpeg_quality: u8,
}

impl Default for ImageBounds {
    fn default() -> Self {
        Self {
            max_width: 1280,
            max_height: 720,
            jpeg_quality: 70,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub interval: Duration,
    pub model: String,
    pub server_url: String,
    pub route: Route,
    pub bounds: ImageBounds,
    pub data_dir: PathBuf,
    pub instance_port: u16,
    pub keep_flagged: bool,
}

fn truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or_default = |key: &str, default: &str| non_empty(key).unwrap_or_else(|| default.to_string());

        let minutes: u64 = or_default("ACC_INTERVAL_MINUTES", "1")
            .parse()
            .context("ACC_INTERVAL_MINUTES must be a whole number of minutes")?;
        if minutes == 0 {
            bail!("ACC_INTERVAL_MINUTES must be at least 1");
        }

        let server_url = or_default("ACC_SERVER_URL", "http://localhost:8000")
            .trim_end_matches('/')
            .to_string();

        let route = if truthy(&or_default("ACC_USE_SERVER_PROXY", "true")) {
            Route::Relay {
                url: format!("{}/api/openrouter", server_url),
                token: non_empty("ACC_PROXY_TOKEN"),
            }
        } else {
            Route::Direct {
                url: or_default("ACC_OPENROUTER_API_URL", DEFAULT_API_URL),
                api_key: non_empty("ACC_OPENROUTER_API_KEY"),
                proxy: non_empty("ACC_SOCKS5_PROXY"),
            }
        };

        let defaults = ImageBounds::default();
        let bounds = ImageBounds {
            max_width: parse_or(&non_empty, "ACC_MAX_WIDTH", defaults.max_width)?,
            max_height: parse_or(&non_empty, "ACC_MAX_HEIGHT", defaults.max_height)?,
            jpeg_quality: parse_or(&non_empty, "ACC_JPEG_QUALITY", defaults.jpeg_quality)?,
        };
        if bounds.max_width == 0 || bounds.max_height == 0 {
            bail!("ACC_MAX_WIDTH and ACC_MAX_HEIGHT must be positive");
        }
        if !(1..=100).contains(&bounds.jpeg_quality) {
            bail!("ACC_JPEG_QUALITY must be between 1 and 100");
        }

        Ok(Self {
            interval: Duration::from_secs(minutes * 60),
            model: or_default("ACC_VISION_MODEL", DEFAULT_MODEL),
            server_url,
            route,
            bounds,
            data_dir: or_default("ACC_DATA_DIR", "./vigil-data").into(),
            instance_port: parse_or(&non_empty, "ACC_INSTANCE_PORT", DEFAULT_INSTANCE_PORT)?,
            keep_flagged: truthy(&or_default("ACC_KEEP_FLAGGED", "true")),
        })
    }

    pub fn log_url(&self) -> String {
        format!("{}/api/log", self.server_url)
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.parse().with_context(|| format!("{} has an invalid value '{}'", key, raw)),
        None => Ok(default),
    }
}
