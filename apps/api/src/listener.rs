//! Channel listener: pulls posts from the watched channel and runs each one through the
//! workflow, one at a time in arrival order.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::models::message::ChannelMessage;
use crate::models::records::ChannelJobLog;
use crate::settings::ChannelFilter;
use crate::store::ApplicationStore;
use crate::telegram::TelegramClient;
use crate::workflow::{ApplicationWorkflow, Route, WorkflowReport};

/// Pause after a failed poll before trying again.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Where channel posts come from.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Waits for the next batch of posts. An empty batch is normal.
    async fn next_batch(&self) -> anyhow::Result<Vec<ChannelMessage>>;

    /// Display title of a channel, if the transport can resolve it.
    async fn channel_title(&self, chat_id: &str) -> anyhow::Result<Option<String>>;
}

/// Long-polls the Bot API for `channel_post` updates.
pub struct TelegramSource {
    client: TelegramClient,
    next_offset: AtomicI64,
}

impl TelegramSource {
    pub fn new(client: TelegramClient) -> Self {
        Self {
            client,
            next_offset: AtomicI64::new(0),
        }
    }
}

#[async_trait]
impl MessageSource for TelegramSource {
    async fn next_batch(&self) -> anyhow::Result<Vec<ChannelMessage>> {
        let offset = match self.next_offset.load(Ordering::SeqCst) {
            0 => None,
            n => Some(n),
        };
        let updates = self.client.get_updates(offset).await?;

        if let Some(last) = updates.iter().map(|u| u.update_id).max() {
            self.next_offset.store(last + 1, Ordering::SeqCst);
        }
        Ok(updates
            .into_iter()
            .filter_map(|update| update.channel_post)
            .map(ChannelMessage::from)
            .collect())
    }

    async fn channel_title(&self, chat_id: &str) -> anyhow::Result<Option<String>> {
        let chat = self.client.get_chat(chat_id).await?;
        Ok(chat.title.or(chat.username))
    }
}

pub struct Listener {
    source: Arc<dyn MessageSource>,
    workflow: ApplicationWorkflow,
    store: Arc<dyn ApplicationStore>,
    channel: ChannelFilter,
    reconnect_delay: Duration,
}

impl Listener {
    pub fn new(
        source: Arc<dyn MessageSource>,
        workflow: ApplicationWorkflow,
        store: Arc<dyn ApplicationStore>,
    ) -> Self {
        let channel = workflow.settings().channel.clone();
        Self {
            source,
            workflow,
            store,
            channel,
            reconnect_delay: RECONNECT_DELAY,
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Polls forever. Poll failures are logged and retried after the reconnect delay.
    pub async fn run(self) {
        if !self.channel.is_configured() {
            warn!("CHANNEL_ID not configured, every post will be ignored");
        } else {
            info!("Listening to channel {}", self.channel.chat_id());
            self.record_channel_name().await;
        }

        loop {
            match self.source.next_batch().await {
                Ok(batch) => {
                    self.process_batch(batch).await;
                }
                Err(e) => {
                    warn!(
                        "Polling failed, retrying in {}s: {e:#}",
                        self.reconnect_delay.as_secs()
                    );
                    tokio::time::sleep(self.reconnect_delay).await;
                }
            }
        }
    }

    /// Looks the channel title up once and stores it for the dashboard.
    async fn record_channel_name(&self) {
        match self.source.channel_title(self.channel.chat_id()).await {
            Ok(Some(title)) => {
                info!("Channel name: {title}");
                if let Err(e) = self.store.set_channel_name(&title).await {
                    warn!("Failed to store channel name: {e}");
                }
            }
            Ok(None) => debug!("Channel has no title"),
            Err(e) => warn!("Could not look up channel name: {e:#}"),
        }
    }

    /// Runs every post from the watched channel through the workflow, in order.
    /// Returns how many posts were processed.
    pub async fn process_batch(&self, batch: Vec<ChannelMessage>) -> usize {
        let mut processed = 0;

        for message in batch {
            let chat_id = message.channel_id.clone().unwrap_or_default();
            if !self.channel.matches(&chat_id) {
                debug!("Skipping post from chat {chat_id}");
                continue;
            }

            let preview: String = message.message.chars().take(80).collect();
            info!("New channel post: {preview}");

            let workflow = self.workflow.clone();
            let post = message.clone();
            let report = match tokio::spawn(async move { workflow.process_message(&post).await }).await {
                Ok(report) => report,
                Err(e) => {
                    error!("Workflow task panicked: {e}");
                    continue;
                }
            };
            info!("Post processed: {}", report.outcome_label());

            if let Err(e) = self.store.put_channel_log(&channel_log(&message, &report)).await {
                warn!("Failed to write channel log: {e}");
            }
            processed += 1;
        }

        processed
    }
}

fn channel_log(message: &ChannelMessage, report: &WorkflowReport) -> ChannelJobLog {
    let now = Utc::now();
    ChannelJobLog {
        id: Uuid::new_v4(),
        job_id: report.job.as_ref().map(|job| job.id()),
        posted_at: Utc.timestamp_opt(message.date, 0).single().unwrap_or(now),
        matched_keywords: report
            .keywords
            .as_ref()
            .map(|k| k.found_keywords.clone())
            .unwrap_or_default(),
        route: report.route.map(|route| match route {
            Route::Automatic => "automatic".to_string(),
            Route::ManualApproval => "manual_approval".to_string(),
        }),
        outcome: report.outcome_label(),
        error: report.result.as_ref().and_then(|r| r.error.clone()),
        timestamp: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::test_support::Harness;

    /// Hands out scripted batches, then reports errors.
    struct ScriptedSource {
        batches: Mutex<Vec<Vec<ChannelMessage>>>,
        title: Option<String>,
    }

    #[async_trait]
    impl MessageSource for ScriptedSource {
        async fn next_batch(&self) -> anyhow::Result<Vec<ChannelMessage>> {
            let mut batches = self.batches.lock().unwrap();
            if batches.is_empty() {
                anyhow::bail!("connection lost");
            }
            Ok(batches.remove(0))
        }

        async fn channel_title(&self, _chat_id: &str) -> anyhow::Result<Option<String>> {
            Ok(self.title.clone())
        }
    }

    fn post(text: &str, chat_id: &str, job: &str) -> ChannelMessage {
        let mut message = ChannelMessage::text(text, 1_700_000_000)
            .with_link_button(format!("https://t.me/jobs_bot/app?startapp={job}"));
        message.channel_id = Some(chat_id.to_string());
        message
    }

    fn listener(h: &Harness, batches: Vec<Vec<ChannelMessage>>) -> Listener {
        let source = Arc::new(ScriptedSource {
            batches: Mutex::new(batches),
            title: Some("Remote Rust Jobs".to_string()),
        });
        Listener::new(source, h.workflow.clone(), h.store.clone())
            .with_reconnect_delay(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_batch_skips_other_channels() {
        let h = Harness::standard();
        let l = listener(&h, Vec::new());

        let processed = l
            .process_batch(vec![
                post("Remote backend Rust role", "-1001234567890", "job-1"),
                post("Remote backend Rust role", "-100999", "job-2"),
            ])
            .await;

        assert_eq!(processed, 1);
        assert_eq!(h.board.submission_count(), 1);
    }

    #[tokio::test]
    async fn test_batch_writes_channel_logs() {
        let h = Harness::standard();
        let l = listener(&h, Vec::new());

        l.process_batch(vec![
            post("Remote backend Rust role", "1234567890", "job-1"),
            post("Cashier wanted", "1234567890", "job-2"),
        ])
        .await;

        let logs = h.store.channel_logs.lock().unwrap().clone();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].job_id.as_deref(), Some("job-1"));
        assert_eq!(logs[0].outcome, "notified");
        assert_eq!(logs[0].route.as_deref(), Some("automatic"));
        assert_eq!(logs[0].matched_keywords, vec!["rust", "remote", "backend"]);
        assert_eq!(logs[1].outcome, "ignored");
        assert!(logs[1].route.is_none());
    }

    #[tokio::test]
    async fn test_run_survives_poll_errors() {
        let h = Harness::standard();
        let l = listener(
            &h,
            vec![vec![post("Remote backend Rust role", "-1001234567890", "job-7")]],
        );

        let handle = tokio::spawn(l.run());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!handle.is_finished());
        handle.abort();

        assert_eq!(h.board.submission_count(), 1);
        let config = h.store.config.lock().unwrap().clone().unwrap();
        assert_eq!(config.channel_name.as_deref(), Some("Remote Rust Jobs"));
    }
}
