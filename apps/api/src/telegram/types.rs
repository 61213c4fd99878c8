use serde::{Deserialize, Serialize};

use crate::models::message::{Button, ButtonRow, ChannelMessage, ReplyMarkup};

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub channel_post: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub date: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    /// Media posts carry their text here.
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InlineKeyboardMarkup {
    #[serde(default)]
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InlineKeyboardButton {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GetUpdatesRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    pub timeout: u64,
    pub allowed_updates: &'a [&'a str],
}

#[derive(Debug, Serialize)]
pub(crate) struct SendMessageRequest<'a> {
    pub chat_id: &'a str,
    pub text: &'a str,
    pub parse_mode: &'a str,
    pub disable_web_page_preview: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct GetChatRequest<'a> {
    pub chat_id: &'a str,
}

impl From<Message> for ChannelMessage {
    fn from(message: Message) -> Self {
        let reply_markup = message.reply_markup.map(|markup| ReplyMarkup {
            rows: markup
                .inline_keyboard
                .into_iter()
                .map(|row| ButtonRow {
                    buttons: row
                        .into_iter()
                        .map(|button| Button {
                            text: Some(button.text),
                            url: button.url,
                        })
                        .collect(),
                })
                .collect(),
        });

        ChannelMessage {
            message: message.text.or(message.caption).unwrap_or_default(),
            date: message.date,
            reply_markup,
            channel_id: Some(message.chat.id.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::{extract_job_reference, JobReference};

    #[test]
    fn test_channel_post_maps_to_channel_message() {
        let raw = serde_json::json!({
            "update_id": 7,
            "channel_post": {
                "message_id": 11,
                "date": 1_700_000_000,
                "chat": { "id": -1001234567890_i64, "title": "Jobs", "type": "channel" },
                "text": "Job Title: Rust Engineer",
                "reply_markup": {
                    "inline_keyboard": [[
                        { "text": "View", "url": "https://t.me/jobs_bot/app?startapp=abc123" }
                    ]]
                }
            }
        });
        let update: Update = serde_json::from_value(raw).unwrap();
        let message: ChannelMessage = update.channel_post.unwrap().into();

        assert_eq!(message.message, "Job Title: Rust Engineer");
        assert_eq!(message.channel_id.as_deref(), Some("-1001234567890"));
        assert_eq!(
            extract_job_reference(&message),
            Some(JobReference::Real("abc123".to_string()))
        );
    }

    #[test]
    fn test_caption_used_when_text_absent() {
        let raw = serde_json::json!({
            "message_id": 1,
            "date": 0,
            "chat": { "id": 5 },
            "caption": "Photo post about a remote role"
        });
        let message: ChannelMessage = serde_json::from_value::<Message>(raw).unwrap().into();
        assert_eq!(message.message, "Photo post about a remote role");
        assert!(message.reply_markup.is_none());
    }

    #[test]
    fn test_error_envelope_parses() {
        let raw = r#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#;
        let response: ApiResponse<Vec<Update>> = serde_json::from_str(raw).unwrap();
        assert!(!response.ok);
        assert!(response.result.is_none());
        assert_eq!(response.error_code, Some(401));
    }
}
