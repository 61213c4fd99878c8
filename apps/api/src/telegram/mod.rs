//! Telegram Bot API transport: channel posts in, operator notifications out.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::workflow::{Notification, Notifier};

pub mod types;

pub use types::{Chat, Message, Update};
use types::{ApiResponse, GetChatRequest, GetUpdatesRequest, SendMessageRequest};

/// Server-side wait for `getUpdates` long polling.
pub const LONG_POLL_SECS: u64 = 25;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error ({code:?}): {description}")]
    Api {
        code: Option<i64>,
        description: String,
    },

    #[error("Telegram API returned ok without a result")]
    EmptyResult,
}

#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    method_base: String,
}

impl TelegramClient {
    pub fn new(api_url: &str, bot_token: &str, timeout: Duration) -> Result<Self, TelegramError> {
        Ok(Self {
            http: Client::builder().timeout(timeout).build()?,
            method_base: format!("{}/bot{}", api_url.trim_end_matches('/'), bot_token),
        })
    }

    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
        timeout: Option<Duration>,
    ) -> Result<T, TelegramError> {
        let mut request = self
            .http
            .post(format!("{}/{}", self.method_base, method))
            .json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        // Bot API errors come back as non-2xx with a JSON envelope; read it either way.
        let response: ApiResponse<T> = request.send().await?.json().await?;
        if !response.ok {
            return Err(TelegramError::Api {
                code: response.error_code,
                description: response
                    .description
                    .unwrap_or_else(|| format!("{method} failed")),
            });
        }
        response.result.ok_or(TelegramError::EmptyResult)
    }

    /// Long-polls for channel posts after `offset`.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, TelegramError> {
        let body = GetUpdatesRequest {
            offset,
            timeout: LONG_POLL_SECS,
            allowed_updates: &["channel_post"],
        };
        let updates: Vec<Update> = self
            .call(
                "getUpdates",
                &body,
                Some(Duration::from_secs(LONG_POLL_SECS + 10)),
            )
            .await?;
        debug!("getUpdates returned {} update(s)", updates.len());
        Ok(updates)
    }

    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), TelegramError> {
        let body = SendMessageRequest {
            chat_id,
            text,
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        };
        let _: Message = self.call("sendMessage", &body, None).await?;
        Ok(())
    }

    pub async fn get_chat(&self, chat_id: &str) -> Result<Chat, TelegramError> {
        self.call("getChat", &GetChatRequest { chat_id }, None).await
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Notifier
// ────────────────────────────────────────────────────────────────────────────

/// Sends workflow notifications to the operator's private chat.
///
/// Without a bot token or a target user id, notifications are skipped with a warning.
pub struct TelegramNotifier {
    client: Option<TelegramClient>,
    target_user_id: Option<String>,
}

impl TelegramNotifier {
    pub fn new(client: Option<TelegramClient>, target_user_id: Option<String>) -> Self {
        Self {
            client,
            target_user_id,
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        let (Some(client), Some(target)) = (&self.client, &self.target_user_id) else {
            warn!(
                job_id = %notification.job_id(),
                "No bot token or TARGET_USER_ID configured, notification skipped"
            );
            return Ok(());
        };

        client.send_message(target, &notification.render()).await?;
        info!(job_id = %notification.job_id(), "Notification sent to operator");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_base_includes_token() {
        let client =
            TelegramClient::new("https://api.telegram.org/", "123:abc", Duration::from_secs(5))
                .unwrap();
        assert_eq!(client.method_base, "https://api.telegram.org/bot123:abc");
    }

    #[tokio::test]
    async fn test_notifier_without_target_skips() {
        let client =
            TelegramClient::new("http://127.0.0.1:9", "123:abc", Duration::from_secs(1)).unwrap();
        let notifier = TelegramNotifier::new(Some(client), None);
        let notification = Notification::Failed {
            job_id: "job-1".to_string(),
            job_title: None,
            error: "boom".to_string(),
        };
        assert!(notifier.notify(&notification).await.is_ok());
    }

    #[tokio::test]
    async fn test_notifier_surfaces_transport_errors() {
        let client =
            TelegramClient::new("http://127.0.0.1:9", "123:abc", Duration::from_secs(1)).unwrap();
        let notifier = TelegramNotifier::new(Some(client), Some("42".to_string()));
        let notification = Notification::Failed {
            job_id: "job-1".to_string(),
            job_title: None,
            error: "boom".to_string(),
        };
        assert!(notifier.notify(&notification).await.is_err());
    }
}
