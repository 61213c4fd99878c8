use serde::{Deserialize, Serialize};

/// An inbound post from the watched channel, reduced to what the workflow reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMessage {
    /// Raw text body (or media caption).
    #[serde(default)]
    pub message: String,
    /// Posting time, epoch seconds.
    pub date: i64,
    #[serde(default)]
    pub reply_markup: Option<ReplyMarkup>,
    /// Chat id the post arrived in, as reported by the transport.
    #[serde(default)]
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplyMarkup {
    #[serde(default)]
    pub rows: Vec<ButtonRow>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ButtonRow {
    #[serde(default)]
    pub buttons: Vec<Button>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Button {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl ChannelMessage {
    pub fn text(text: impl Into<String>, date: i64) -> Self {
        Self {
            message: text.into(),
            date,
            ..Default::default()
        }
    }

    /// Attaches a single-row keyboard with one URL button.
    pub fn with_link_button(mut self, url: impl Into<String>) -> Self {
        self.reply_markup = Some(ReplyMarkup {
            rows: vec![ButtonRow {
                buttons: vec![Button {
                    text: Some("Apply".to_string()),
                    url: Some(url.into()),
                }],
            }],
        });
        self
    }

    /// First line of the post with a leading "Job Title:" label stripped.
    pub fn headline(&self) -> String {
        self.message
            .lines()
            .next()
            .unwrap_or_default()
            .replacen("Job Title:", "", 1)
            .trim()
            .to_string()
    }

    /// The post text capped to the job board's description length.
    pub fn description(&self) -> String {
        self.message.chars().take(1000).collect()
    }
}
