use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AudioCallError, Result};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;
const DEFAULT_RATE_LIMIT_MAX_REQUESTS: usize = 10;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

const ALLOWED_URL_SCHEMES: [&str; 4] = ["ws", "wss", "http", "https"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub livekit: LivekitSettings,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub token: TokenSettings,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
}

#[derive(Clone, Default, Deserialize)]
pub struct LivekitSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub api_secret: String,
    #[serde(default)]
    pub url: String,
}

impl fmt::Debug for LivekitSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LivekitSettings")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("url", &self.url)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub host: String,
    pub port: u16,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TokenSettings {
    pub ttl_secs: u64,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }
}

/// Off unless an operator turns it on: the token endpoint is open by default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub enabled: bool,
    pub max_requests: usize,
    pub window_secs: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            max_requests: DEFAULT_RATE_LIMIT_MAX_REQUESTS,
            window_secs: DEFAULT_RATE_LIMIT_WINDOW_SECS,
        }
    }
}

impl RateLimitSettings {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Settings {
    /// Reads settings from the process environment only.
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Reads the optional TOML file, applies environment overrides and validates.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        settings.apply_overrides(|name| std::env::var(name).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parses a TOML settings file without validating it.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AudioCallError::Config(format!("Failed to read config file: {}", e))
        })?;

        let settings: Settings = toml::from_str(&content).map_err(|e| {
            AudioCallError::Config(format!("Failed to parse config file: {}", e))
        })?;

        Ok(settings)
    }

    /// Overrides fields with any variables `lookup` resolves.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("LIVEKIT_API_KEY") {
            self.livekit.api_key = value;
        }
        if let Some(value) = lookup("LIVEKIT_API_SECRET") {
            self.livekit.api_secret = value;
        }
        if let Some(value) = lookup("LIVEKIT_URL") {
            self.livekit.url = value;
        }
        if let Some(value) = lookup("SERVER_HOST") {
            self.http.host = value;
        }
        if let Some(value) = lookup("SERVER_PORT") {
            self.http.port = parse_var("SERVER_PORT", &value)?;
        }
        if let Some(value) = lookup("TOKEN_TTL_SECS") {
            self.token.ttl_secs = parse_var("TOKEN_TTL_SECS", &value)?;
        }
        if let Some(value) = lookup("RATE_LIMIT_ENABLED") {
            self.rate_limit.enabled = parse_flag("RATE_LIMIT_ENABLED", &value)?;
        }
        if let Some(value) = lookup("RATE_LIMIT_MAX_REQUESTS") {
            self.rate_limit.max_requests = parse_var("RATE_LIMIT_MAX_REQUESTS", &value)?;
        }
        if let Some(value) = lookup("RATE_LIMIT_WINDOW_SECS") {
            self.rate_limit.window_secs = parse_var("RATE_LIMIT_WINDOW_SECS", &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.livekit.api_key.trim().is_empty() {
            return Err(config_error("LIVEKIT_API_KEY is not set"));
        }
        if self.livekit.api_secret.is_empty() {
            return Err(config_error("LIVEKIT_API_SECRET is not set"));
        }
        validate_url(&self.livekit.url)?;

        if self.http.host.trim().is_empty() {
            return Err(config_error("SERVER_HOST must not be empty"));
        }
        if self.http.port == 0 {
            return Err(config_error("SERVER_PORT must be greater than zero"));
        }
        if self.token.ttl_secs == 0 {
            return Err(config_error("TOKEN_TTL_SECS must be greater than zero"));
        }
        if self.rate_limit.enabled
            && (self.rate_limit.max_requests == 0 || self.rate_limit.window_secs == 0)
        {
            return Err(config_error(
                "rate limiting is enabled but its request limit or window is zero",
            ));
        }
        Ok(())
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token.ttl_secs)
    }
}

fn config_error(message: &str) -> AudioCallError {
    AudioCallError::Config(message.to_string())
}

fn validate_url(url: &str) -> Result<()> {
    if url.trim().is_empty() {
        return Err(config_error("LIVEKIT_URL is not set"));
    }

    let (scheme, rest) = url
        .split_once("://")
        .ok_or_else(|| AudioCallError::Config(format!("LIVEKIT_URL '{}' has no scheme", url)))?;

    if !ALLOWED_URL_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()) {
        return Err(AudioCallError::Config(format!(
            "LIVEKIT_URL scheme '{}' is not one of {:?}",
            scheme, ALLOWED_URL_SCHEMES
        )));
    }
    if rest.is_empty() || rest.starts_with('/') {
        return Err(AudioCallError::Config(format!(
            "LIVEKIT_URL '{}' has no host",
            url
        )));
    }
    Ok(())
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        AudioCallError::Config(format!("{} has an invalid value '{}'", name, value))
    })
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AudioCallError::Config(format!(
            "{} has an invalid value '{}'",
            name, value
        ))),
    }
}
