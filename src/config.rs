//! Server configuration loaded from environment variables.
//!
//! Every setting has a default so the server starts with zero configuration
//! for local development. A `.env` file is honoured through `dotenvy`.

use chrono::TimeDelta;
use di::{inject, injectable};
use log::warn;
use sqlx::sqlite::SqliteConnectOptions;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://support-chat.db?mode=rwc";
pub const DEFAULT_COMPLETION_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_COMPLETION_MODEL: &str = "openai/gpt-3.5-turbo";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Env: `DATABASE_URL`
    pub database: SqliteConnectOptions,
    /// Env: `PORT` (binds `0.0.0.0:<PORT>`), default 5000.
    pub http_addr: SocketAddr,
    pub completion: CompletionSettings,
    /// Env: `CORS_ORIGIN`
    pub cors_origin: String,
    /// Env: `SESSION_TTL_HOURS`, default one week.
    pub session_ttl: TimeDelta,
    /// Requests allowed per client IP per window. Env: `RATE_LIMIT_MAX`
    pub rate_limit_max: u32,
    /// Env: `RATE_LIMIT_WINDOW_SECS`
    pub rate_limit_window: Duration,
}

/// Settings for the upstream completion API.
#[derive(Clone)]
pub struct CompletionSettings {
    /// Env: `OPENROUTER_API_KEY`. Without a key every completion falls back.
    pub api_key: Option<String>,
    /// Env: `COMPLETION_BASE_URL`
    pub base_url: String,
    /// Env: `COMPLETION_MODEL`
    pub model: String,
    /// Env: `COMPLETION_TIMEOUT_SECS`
    pub timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
    pub referer: String,
    pub app_title: String,
}

impl fmt::Debug for CompletionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_COMPLETION_BASE_URL.to_owned(),
            model: DEFAULT_COMPLETION_MODEL.to_owned(),
            timeout: Duration::from_secs(30),
            max_tokens: 500,
            temperature: 0.7,
            referer: DEFAULT_CORS_ORIGIN.to_owned(),
            app_title: "AI Customer Support".to_owned(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: default_database_options(),
            http_addr: ([0, 0, 0, 0], 5000).into(),
            completion: CompletionSettings::default(),
            cors_origin: DEFAULT_CORS_ORIGIN.to_owned(),
            session_ttl: TimeDelta::days(7),
            rate_limit_max: 100,
            rate_limit_window: Duration::from_secs(15 * 60),
        }
    }
}

#[injectable]
impl AppConfig {
    #[inject]
    pub fn create() -> AppConfig {
        dotenvy::dotenv().ok();
        AppConfig::from_env()
    }
}

impl AppConfig {
    /// Load configuration from the process environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Invalid values are logged and replaced by their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("DATABASE_URL") {
            match SqliteConnectOptions::from_str(&url) {
                Ok(options) => config.database = options.foreign_keys(true),
                Err(e) => warn!("invalid DATABASE_URL ({e}), using {DEFAULT_DATABASE_URL}"),
            }
        }

        if let Some(port) = lookup("PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => config.http_addr = ([0, 0, 0, 0], port).into(),
                Err(_) => warn!("invalid PORT {port:?}, using {}", config.http_addr),
            }
        }

        if let Some(key) = lookup("OPENROUTER_API_KEY") {
            let key = key.trim();
            if !key.is_empty() {
                config.completion.api_key = Some(key.to_owned());
            }
        }

        if let Some(url) = lookup("COMPLETION_BASE_URL") {
            config.completion.base_url = url.trim_end_matches('/').to_owned();
        }

        if let Some(model) = lookup("COMPLETION_MODEL") {
            config.completion.model = model;
        }

        if let Some(secs) = parse_number::<u64>(&lookup, "COMPLETION_TIMEOUT_SECS") {
            config.completion.timeout = Duration::from_secs(secs.max(1));
        }

        if let Some(origin) = lookup("CORS_ORIGIN") {
            config.completion.referer = origin.clone();
            config.cors_origin = origin;
        }

        if let Some(hours) = parse_number::<i64>(&lookup, "SESSION_TTL_HOURS") {
            match TimeDelta::try_hours(hours.max(1)) {
                Some(ttl) => config.session_ttl = ttl,
                None => warn!("SESSION_TTL_HOURS out of range, using default"),
            }
        }

        if let Some(max) = parse_number::<u32>(&lookup, "RATE_LIMIT_MAX") {
            config.rate_limit_max = max.max(1);
        }

        if let Some(secs) = parse_number::<u64>(&lookup, "RATE_LIMIT_WINDOW_SECS") {
            config.rate_limit_window = Duration::from_secs(secs.max(1));
        }

        config
    }
}

fn default_database_options() -> SqliteConnectOptions {
    SqliteConnectOptions::from_str(DEFAULT_DATABASE_URL)
        .unwrap_or_default()
        .create_if_missing(true)
        .foreign_keys(true)
}

fn parse_number<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("invalid {key} {raw:?}, using default");
            None
        }
    }
}
