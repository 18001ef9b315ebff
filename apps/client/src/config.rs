use std::time::Duration;

use anyhow::{Context, Result};

/// Client configuration loaded from environment variables.
/// Fails at startup if `API_BASE_URL` is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub hint_store_path: String,
    pub request_timeout: Duration,
    pub start_path: String,
    pub guest_mode: bool,
    pub session_cookie: Option<String>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let timeout_secs = optional_env("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u64>()
            .context("REQUEST_TIMEOUT_SECS must be a whole number of seconds")?;

        let guest_mode = match optional_env("GUEST_MODE") {
            Some(raw) => parse_flag(&raw)
                .with_context(|| format!("GUEST_MODE must be true or false, got '{raw}'"))?,
            None => false,
        };

        Ok(Config {
            api_base_url: require_env("API_BASE_URL")?,
            hint_store_path: optional_env("HINT_STORE_PATH")
                .unwrap_or_else(|| ".prepspace/state.json".to_string()),
            request_timeout: Duration::from_secs(timeout_secs),
            start_path: optional_env("START_PATH").unwrap_or_else(|| "/".to_string()),
            guest_mode,
            session_cookie: optional_env("SESSION_COOKIE"),
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
