use serde::{Deserialize, Serialize};

/// Bot configuration document as stored under `botConfig/main`.
///
/// Every field is optional on the wire; defaults are applied when the document is
/// resolved into `BotSettings`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BotConfig {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_keyword_matches: Option<u32>,
    /// Only an explicit `false` turns auto-apply off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_apply: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_prompt: Option<String>,
    #[serde(default)]
    pub expertise: Expertise,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
    #[serde(default)]
    pub env: ChannelCredentials,
}

/// Applicant profile fields substituted into the cover-letter prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Expertise {
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
}

/// Credentials and identities the bot runs with.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_init_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,
}

// Secrets stay out of logs.
impl std::fmt::Debug for ChannelCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelCredentials")
            .field("channel_id", &self.channel_id)
            .field("telegram_username", &self.telegram_username)
            .field("telegram_init_data", &self.telegram_init_data.as_ref().map(|_| "<set>"))
            .field("target_user_id", &self.target_user_id)
            .field("llm_api_key", &self.llm_api_key.as_ref().map(|_| "<set>"))
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<set>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_dashboard_document() {
        let json = r#"{
            "keywords": ["Rust", "Remote"],
            "minimumKeywordMatches": 2,
            "autoApply": false,
            "expertise": {"skills": ["Rust"], "education": "BSc"},
            "env": {"channelId": "1234567890", "telegramUsername": "alice"}
        }"#;
        let config: BotConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.keywords, vec!["Rust", "Remote"]);
        assert_eq!(config.minimum_keyword_matches, Some(2));
        assert_eq!(config.auto_apply, Some(false));
        assert_eq!(config.expertise.education.as_deref(), Some("BSc"));
        assert_eq!(config.env.channel_id.as_deref(), Some("1234567890"));
    }

    #[test]
    fn test_empty_document_is_valid() {
        let config: BotConfig = serde_json::from_str("{}").unwrap();
        assert!(config.keywords.is_empty());
        assert_eq!(config.auto_apply, None);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = ChannelCredentials {
            telegram_init_data: Some("query_id=secret".to_string()),
            llm_api_key: Some("sk-secret".to_string()),
            ..Default::default()
        };
        let printed = format!("{creds:?}");
        assert!(!printed.contains("secret"));
        assert!(printed.contains("<set>"));
    }
}
