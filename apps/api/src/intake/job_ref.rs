use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::message::ChannelMessage;

const DEEP_LINK_PARAM: &str = "startapp=";
const PLACEHOLDER_PREFIX: &str = "TEST-";

/// Which job a workflow run is about.
///
/// `Placeholder` stands in for posts without a deep link. Such jobs are never checked
/// for eligibility, never auto-submitted and never get a generated cover letter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum JobReference {
    Real(String),
    /// Synthesized at the given epoch milliseconds.
    Placeholder(i64),
}

impl JobReference {
    /// Reads an identifier from a deep link, storage or the dashboard.
    pub fn parse(id: &str) -> Self {
        id.strip_prefix(PLACEHOLDER_PREFIX)
            .and_then(|millis| millis.parse::<i64>().ok())
            .map(JobReference::Placeholder)
            .unwrap_or_else(|| JobReference::Real(id.to_string()))
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, JobReference::Placeholder(_))
    }

    /// The identifier as the job board and the store know it.
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for JobReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobReference::Real(id) => f.write_str(id),
            JobReference::Placeholder(millis) => write!(f, "{PLACEHOLDER_PREFIX}{millis}"),
        }
    }
}

impl From<JobReference> for String {
    fn from(reference: JobReference) -> Self {
        reference.to_string()
    }
}

impl From<String> for JobReference {
    fn from(id: String) -> Self {
        JobReference::parse(&id)
    }
}

/// Pulls the job id out of the first deep-link button carrying `startapp=`.
///
/// Posts without any such button get a placeholder reference so manual test posts still
/// flow through to the approval queue. Returns `None` only when a deep link is present
/// but carries no identifier.
pub fn extract_job_reference(message: &ChannelMessage) -> Option<JobReference> {
    extract_job_reference_at(message, Utc::now().timestamp_millis())
}

pub fn extract_job_reference_at(message: &ChannelMessage, now_millis: i64) -> Option<JobReference> {
    let deep_link = message
        .reply_markup
        .iter()
        .flat_map(|markup| markup.rows.iter())
        .flat_map(|row| row.buttons.iter())
        .filter_map(|button| button.url.as_deref())
        .find(|url| url.contains(DEEP_LINK_PARAM));

    match deep_link {
        Some(url) => {
            let id = url.split(DEEP_LINK_PARAM).nth(1).unwrap_or_default();
            if id.is_empty() {
                warn!("Deep link without a job id: {url}");
                None
            } else {
                Some(JobReference::parse(id))
            }
        }
        None => {
            debug!("No job id in message buttons, using placeholder reference");
            Some(JobReference::Placeholder(now_millis))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::{Button, ButtonRow, ReplyMarkup};

    #[test]
    fn test_extracts_id_from_deep_link() {
        let msg = ChannelMessage::text("job", 0).with_link_button("https://t.me/jobsbot/x?startapp=abc123");
        assert_eq!(
            extract_job_reference(&msg),
            Some(JobReference::Real("abc123".to_string()))
        );
    }

    #[test]
    fn test_deep_link_with_placeholder_id_stays_placeholder() {
        let msg = ChannelMessage::text("job", 0).with_link_button("https://t.me/jobsbot/x?startapp=TEST-123");
        let reference = extract_job_reference(&msg).unwrap();
        assert_eq!(reference, JobReference::Placeholder(123));
        assert_eq!(reference.id(), "TEST-123");
    }

    #[test]
    fn test_message_without_buttons_gets_placeholder() {
        let msg = ChannelMessage::text("job", 0);
        let reference = extract_job_reference_at(&msg, 1_700_000_000_123).unwrap();
        assert_eq!(reference, JobReference::Placeholder(1_700_000_000_123));
        assert_eq!(reference.id(), "TEST-1700000000123");
    }

    #[test]
    fn test_placeholder_id_is_test_prefix_and_digits() {
        let id = extract_job_reference(&ChannelMessage::text("job", 0)).unwrap().id();
        let digits = id.strip_prefix("TEST-").expect("placeholder prefix");
        assert!(!digits.is_empty());
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_skips_buttons_without_deep_link() {
        let msg = ChannelMessage {
            message: "job".to_string(),
            date: 0,
            reply_markup: Some(ReplyMarkup {
                rows: vec![
                    ButtonRow {
                        buttons: vec![
                            Button { text: Some("Share".to_string()), url: None },
                            Button {
                                text: Some("Site".to_string()),
                                url: Some("https://example.com".to_string()),
                            },
                        ],
                    },
                    ButtonRow {
                        buttons: vec![Button {
                            text: Some("Apply".to_string()),
                            url: Some("https://t.me/bot?startapp=second-row".to_string()),
                        }],
                    },
                ],
            }),
            channel_id: None,
        };
        assert_eq!(
            extract_job_reference(&msg),
            Some(JobReference::Real("second-row".to_string()))
        );
    }

    #[test]
    fn test_empty_deep_link_yields_none() {
        let msg = ChannelMessage::text("job", 0).with_link_button("https://t.me/bot?startapp=");
        assert_eq!(extract_job_reference(&msg), None);
    }

    #[test]
    fn test_buttons_without_deep_link_fall_back_to_placeholder() {
        let msg = ChannelMessage::text("job", 0).with_link_button("https://example.com/jobs/1");
        assert!(extract_job_reference(&msg).unwrap().is_placeholder());
    }

    #[test]
    fn test_parse_round_trips_placeholder_and_real() {
        assert_eq!(JobReference::parse("TEST-42"), JobReference::Placeholder(42));
        assert_eq!(
            JobReference::parse("2f1c0d9e-real"),
            JobReference::Real("2f1c0d9e-real".to_string())
        );
        // Not digits after the prefix: treated as a real id
        assert_eq!(
            JobReference::parse("TEST-abc"),
            JobReference::Real("TEST-abc".to_string())
        );
    }
}
