use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// The job board rejects cover letters longer than this many characters.
pub const COVER_LETTER_LIMIT: usize = 1000;
const ELLIPSIS: &str = "...";

/// Fits `text` into the job board's cover-letter field.
///
/// Text over the limit keeps its first 997 characters followed by `...`, so the result is
/// exactly `COVER_LETTER_LIMIT` characters long.
pub fn clamp_cover_letter(text: &str) -> String {
    if text.chars().count() <= COVER_LETTER_LIMIT {
        return text.to_string();
    }
    let keep = COVER_LETTER_LIMIT - ELLIPSIS.len();
    let mut clamped: String = text.chars().take(keep).collect();
    clamped.push_str(ELLIPSIS);
    clamped
}

// ────────────────────────────────────────────────────────────────────────────
// Domain types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub id: String,
    #[serde(default)]
    pub professional_title: Option<String>,
}

/// A vacancy as the job board describes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub id: String,
    pub title: Option<String>,
    pub approval_status: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub company: Option<String>,
    pub job_type: Option<String>,
    pub location: Option<String>,
    pub experience_level: Option<String>,
}

impl JobPosting {
    pub fn is_approved(&self) -> bool {
        self.approval_status.as_deref() == Some("approved")
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.deadline.map(|deadline| deadline < now).unwrap_or(false)
    }
}

/// One submission attempt. Built once and never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationPayload {
    job_id: String,
    profile_id: String,
    cover_letter: String,
    origin_platform_id: String,
    share_id: Option<String>,
    telegram_username: Option<String>,
}

impl ApplicationPayload {
    /// The cover letter is clamped to the job board's limit.
    pub fn new(
        job_id: impl Into<String>,
        profile_id: impl Into<String>,
        cover_letter: &str,
        origin_platform_id: impl Into<String>,
        share_id: Option<String>,
        telegram_username: Option<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            profile_id: profile_id.into(),
            cover_letter: clamp_cover_letter(cover_letter),
            origin_platform_id: origin_platform_id.into(),
            share_id,
            telegram_username,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    pub fn cover_letter(&self) -> &str {
        &self.cover_letter
    }

    pub fn origin_platform_id(&self) -> &str {
        &self.origin_platform_id
    }

    pub fn share_id(&self) -> Option<&str> {
        self.share_id.as_deref()
    }

    pub fn telegram_username(&self) -> Option<&str> {
        self.telegram_username.as_deref()
    }

    pub(crate) fn to_variables(&self) -> serde_json::Value {
        serde_json::json!({
            "application": {
                "cover_letter": self.cover_letter,
                "files": [],
            },
            "job_id": self.job_id,
            "origin_platform_id": self.origin_platform_id,
            "share_id": self.share_id,
            "telegramUsername": self.telegram_username,
            "profile_id": self.profile_id,
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphQlRequest<'a> {
    pub operation_name: &'a str,
    pub query: &'a str,
    pub variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlErrorItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlErrorItem {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValidateResponse {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IdRow {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UsersData {
    #[serde(default)]
    pub users: Vec<IdRow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobSeekerRow {
    pub id: String,
    pub default_profile_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobSeekersData {
    #[serde(default)]
    pub job_seekers: Vec<JobSeekerRow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobSeekerProfiles {
    #[serde(default)]
    pub profiles: Vec<ProfileSummary>,
    pub default_profile_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProfilesData {
    pub job_seekers_by_pk: Option<JobSeekerProfiles>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PlatformsData {
    #[serde(default)]
    pub platforms: Vec<IdRow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EntityRow {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobDetailsRow {
    pub id: String,
    pub title: Option<String>,
    pub approval_status: Option<String>,
    pub job_type: Option<String>,
    pub location: Option<String>,
    pub entity: Option<EntityRow>,
    pub deadline: Option<String>,
    pub experience_level: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct JobDetailsData {
    #[serde(default)]
    pub view_job_details: Vec<JobDetailsRow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApplyResult {
    pub application_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApplyData {
    pub apply_to_job: Option<ApplyResult>,
}

impl From<JobDetailsRow> for JobPosting {
    fn from(row: JobDetailsRow) -> Self {
        JobPosting {
            id: row.id,
            title: row.title,
            approval_status: row.approval_status,
            deadline: row.deadline.as_deref().and_then(parse_deadline),
            description: row.description,
            company: row.entity.and_then(|e| e.name),
            job_type: row.job_type,
            location: row.location,
            experience_level: row.experience_level,
        }
    }
}

/// Accepts RFC 3339 timestamps, zone-less timestamps (read as UTC) and bare dates
/// (midnight UTC). Anything else is treated as "no deadline".
pub fn parse_deadline(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ts.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ts| ts.and_utc())
}
