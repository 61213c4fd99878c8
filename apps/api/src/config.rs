use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_JOBBOARD_BASE_URL: &str = "https://api.afriworket.com";
const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Process configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub jobboard: JobBoardSettings,
    pub telegram_api_url: String,
    pub llm_model: Option<String>,
    /// Legacy on-disk bot configuration, read only when nothing else provides one.
    pub config_file: String,
}

/// Connection settings for the job-board API.
#[derive(Debug, Clone)]
pub struct JobBoardSettings {
    pub base_url: String,
    pub auth_url: String,
    /// Skips TLS certificate validation. Local testing only.
    pub insecure_tls: bool,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

/// How many times a remote call is attempted before its failure is reported.
///
/// The default is a single attempt: failures surface to the operator instead of
/// being silently retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 1 }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Exponential backoff before the given (zero-based) attempt: 0, 1s, 2s, 4s...
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(1000 * (1 << (attempt - 1).min(6)))
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let base_url = optional_env("JOBBOARD_BASE_URL")
            .unwrap_or_else(|| DEFAULT_JOBBOARD_BASE_URL.to_string());
        let auth_url = optional_env("JOBBOARD_AUTH_URL")
            .unwrap_or_else(|| format!("{base_url}:9010/mini-app/validate-request"));

        let timeout_secs = optional_env("HTTP_TIMEOUT_SECS")
            .map(|v| v.parse::<u64>())
            .transpose()
            .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?
            .unwrap_or(30);

        let max_attempts = optional_env("REMOTE_MAX_ATTEMPTS")
            .map(|v| v.parse::<u32>())
            .transpose()
            .context("REMOTE_MAX_ATTEMPTS must be a positive integer")?
            .unwrap_or(1);

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            jobboard: JobBoardSettings {
                base_url,
                auth_url,
                insecure_tls: parse_flag(optional_env("JOBBOARD_INSECURE_TLS").as_deref()),
                timeout: Duration::from_secs(timeout_secs),
                retry: RetryPolicy::new(max_attempts),
            },
            telegram_api_url: optional_env("TELEGRAM_API_URL")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
            llm_model: optional_env("LLM_MODEL"),
            config_file: optional_env("CONFIG_FILE").unwrap_or_else(|| "config.json".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Returns the variable's value, treating an empty string as unset.
pub fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}
