use std::fmt;

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::Deserialize;

use super::types::ProfileSummary;

/// The ordered steps that turn channel credentials into a usable session.
/// Each step needs what the previous one produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStep {
    ValidateRequest,
    ResolveUser,
    ResolveJobSeeker,
    ResolveProfiles,
    ResolvePlatform,
}

impl fmt::Display for SessionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SessionStep::ValidateRequest => "Authentication failed (invalid Telegram init data)",
            SessionStep::ResolveUser => "User not found on the job board",
            SessionStep::ResolveJobSeeker => "Job seeker profile not found",
            SessionStep::ResolveProfiles => "No job seeker profiles found",
            SessionStep::ResolvePlatform => "Platform ID \"BOT\" not found",
        };
        f.write_str(text)
    }
}

/// Authenticated identifiers for one workflow run.
///
/// Built by `JobBoard::authenticate` and dropped with the run. Never cached or shared:
/// each run carries its own token lifecycle.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub job_seeker_id: String,
    pub default_profile_id: String,
    pub platform_id: String,
    pub profiles: Vec<ProfileSummary>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("job_seeker_id", &self.job_seeker_id)
            .field("default_profile_id", &self.default_profile_id)
            .field("platform_id", &self.platform_id)
            .field("profiles", &self.profiles.len())
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenClaims {
    sub: Option<String>,
}

/// Reads the `sub` claim from a JWT payload without verifying the signature.
/// The token is only ever sent back to the server that issued it.
pub fn token_subject(token: &str) -> Option<String> {
    let payload = token.split('.').nth(1)?;
    let payload = payload.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))
        .ok()?;
    let claims: TokenClaims = serde_json::from_slice(&bytes).ok()?;
    claims.sub.filter(|s| !s.is_empty())
}

#[derive(Debug, Deserialize)]
struct InitDataUser {
    id: serde_json::Value,
}

/// Extracts the Telegram user id from mini-app init data (`...&user=<json>&...`).
pub fn telegram_id_from_init_data(init_data: &str) -> Option<String> {
    let user_json = url::form_urlencoded::parse(init_data.as_bytes())
        .find(|(key, _)| key == "user")
        .map(|(_, value)| value.into_owned())?;
    let user: InitDataUser = serde_json::from_str(&user_json).ok()?;
    match user.id {
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    }
}
