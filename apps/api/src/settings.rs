//! Resolved bot settings: the stored `BotConfig` document merged with process-environment
//! fallbacks, built once at startup and shared read-only by every workflow run.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::optional_env;
use crate::intake::KeywordMatcher;
use crate::models::config::{BotConfig, Expertise};
use crate::store::ApplicationStore;

const DEFAULT_MINIMUM_MATCHES: usize = 3;

#[derive(Debug, Clone)]
pub struct BotSettings {
    pub matcher: KeywordMatcher,
    pub auto_apply: bool,
    pub prompt_template: Option<String>,
    pub expertise: Expertise,
    pub channel: ChannelFilter,
    pub telegram_username: Option<String>,
    pub telegram_init_data: Option<String>,
    pub target_user_id: Option<String>,
    pub llm_api_key: Option<String>,
    pub bot_token: Option<String>,
}

/// A credential the workflow cannot run without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingCredential {
    TelegramInitData,
    LlmApiKey,
}

impl MissingCredential {
    pub fn message(&self) -> &'static str {
        match self {
            MissingCredential::TelegramInitData => "TELEGRAM_INIT_DATA not configured",
            MissingCredential::LlmApiKey => "ANTHROPIC_API_KEY not configured",
        }
    }
}

impl BotSettings {
    pub fn from_config(config: BotConfig) -> Self {
        Self::resolve(config, optional_env)
    }

    /// Resolves a config document, consulting `env` for credentials the document lacks.
    pub fn resolve(config: BotConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let minimum = match config.minimum_keyword_matches {
            Some(n) if n > 0 => n as usize,
            _ => DEFAULT_MINIMUM_MATCHES,
        };
        let creds = config.env;
        let pick = |value: Option<String>, key: &str| {
            value.filter(|v| !v.trim().is_empty()).or_else(|| env(key))
        };

        let channel_id = pick(creds.channel_id, "CHANNEL_ID").unwrap_or_default();

        Self {
            matcher: KeywordMatcher::new(&config.keywords, minimum),
            auto_apply: config.auto_apply != Some(false),
            prompt_template: config.ai_prompt.filter(|p| !p.trim().is_empty()),
            expertise: config.expertise,
            channel: ChannelFilter::new(&channel_id),
            telegram_username: pick(creds.telegram_username, "TELEGRAM_USERNAME"),
            telegram_init_data: pick(creds.telegram_init_data, "TELEGRAM_INIT_DATA"),
            target_user_id: pick(creds.target_user_id, "TARGET_USER_ID"),
            llm_api_key: pick(creds.llm_api_key, "ANTHROPIC_API_KEY"),
            bot_token: pick(creds.bot_token, "TELEGRAM_BOT_TOKEN"),
        }
    }

    /// First credential missing for a workflow run, if any.
    pub fn missing_credential(&self) -> Option<MissingCredential> {
        if self.telegram_init_data.is_none() {
            Some(MissingCredential::TelegramInitData)
        } else if self.llm_api_key.is_none() {
            Some(MissingCredential::LlmApiKey)
        } else {
            None
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Channel filter
// ────────────────────────────────────────────────────────────────────────────

/// Watched channel id in both its raw and `-100`-prefixed forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelFilter {
    raw: String,
    normalized: String,
}

impl ChannelFilter {
    /// Bare numeric ids of 10+ digits are channel ids and get the `-100` prefix.
    pub fn new(channel_id: &str) -> Self {
        let raw = channel_id.trim().to_string();
        let normalized = if raw.len() >= 10 && raw.chars().all(|c| c.is_ascii_digit()) {
            format!("-100{raw}")
        } else {
            raw.clone()
        };
        Self { raw, normalized }
    }

    pub fn is_configured(&self) -> bool {
        !self.raw.is_empty()
    }

    /// The id to address the channel with.
    pub fn chat_id(&self) -> &str {
        &self.normalized
    }

    pub fn matches(&self, chat_id: &str) -> bool {
        if !self.is_configured() {
            return false;
        }
        let bare = chat_id.strip_prefix("-100").unwrap_or(chat_id);
        chat_id == self.raw
            || chat_id == self.normalized
            || bare == self.raw
            || bare == self.normalized.strip_prefix("-100").unwrap_or(&self.normalized)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Loading
// ────────────────────────────────────────────────────────────────────────────

/// Loads the bot config: `BOT_CONFIG` env JSON, then the store, then the legacy file.
pub async fn load_bot_config(store: &dyn ApplicationStore, legacy_file: &Path) -> Result<BotConfig> {
    if let Some(raw) = optional_env("BOT_CONFIG") {
        let config = serde_json::from_str(&raw).context("BOT_CONFIG is not valid JSON")?;
        info!("Configuration loaded from environment");
        return Ok(config);
    }

    match store.get_config().await {
        Ok(Some(config)) => {
            info!("Configuration loaded from store");
            return Ok(config);
        }
        Ok(None) => warn!("No configuration document in store"),
        Err(e) => warn!("Could not read configuration from store: {e}"),
    }

    if legacy_file.exists() {
        let config = read_config_file(legacy_file)?;
        warn!("Configuration loaded from {} (legacy mode)", legacy_file.display());
        return Ok(config);
    }

    anyhow::bail!("No configuration found in BOT_CONFIG, the store, or {}", legacy_file.display())
}

fn read_config_file(path: &Path) -> Result<BotConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))
}
