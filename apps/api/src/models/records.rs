use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PendingStatus {
    Pending,
}

/// An application waiting for a human decision, stored at `pendingApplications/{jobId}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingApplicationRecord {
    pub job_id: String,
    pub job_description: String,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub matched_keywords: Vec<String>,
    pub cover_letter: String,
    pub status: PendingStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failed,
}

impl Outcome {
    pub fn from_success(success: bool) -> Self {
        if success {
            Outcome::Success
        } else {
            Outcome::Failed
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionMethod {
    Auto,
    Manual,
}

/// Append-only record of a submission attempt, stored at `jobHistory/{jobId}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub job_id: String,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    pub status: Outcome,
    #[serde(default)]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub method: SubmissionMethod,
}

/// A pending application the operator threw away, stored at `disposal/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DisposalRecord {
    pub id: Uuid,
    pub job_id: String,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// One processed channel post, stored at `channelJobLogs/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelJobLog {
    pub id: Uuid,
    #[serde(default)]
    pub job_id: Option<String>,
    pub posted_at: DateTime<Utc>,
    #[serde(default)]
    pub matched_keywords: Vec<String>,
    /// "automatic" or "manual_approval" when the post got that far.
    #[serde(default)]
    pub route: Option<String>,
    /// Final workflow state name, e.g. "submitted" or "ignored".
    pub outcome: String,
    #[serde(default)]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Running counters shown on the dashboard, stored at `botStats/main`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BotStats {
    #[serde(default)]
    pub total_processed: u64,
    #[serde(default)]
    pub successful: u64,
    #[serde(default)]
    pub failed: u64,
    #[serde(default)]
    pub pending: u64,
    #[serde(default)]
    pub last_activity: Option<DateTime<Utc>>,
}

/// Increment applied to `BotStats` after a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsDelta {
    Succeeded,
    Failed,
    Queued,
    /// A queued application left the queue (approved or discarded).
    Dequeued,
}

impl BotStats {
    pub fn apply(&mut self, delta: StatsDelta, at: DateTime<Utc>) {
        match delta {
            StatsDelta::Succeeded => {
                self.total_processed += 1;
                self.successful += 1;
            }
            StatsDelta::Failed => {
                self.total_processed += 1;
                self.failed += 1;
            }
            StatsDelta::Queued => {
                self.total_processed += 1;
                self.pending += 1;
            }
            StatsDelta::Dequeued => {
                self.pending = self.pending.saturating_sub(1);
            }
        }
        self.last_activity = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_record_wire_shape() {
        let record = HistoryRecord {
            job_id: "abc".to_string(),
            job_title: Some("Engineer".to_string()),
            company_name: None,
            status: Outcome::Success,
            error: None,
            timestamp: Utc::now(),
            method: SubmissionMethod::Manual,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["jobId"], "abc");
        assert_eq!(value["status"], "success");
        assert_eq!(value["method"], "manual");
    }

    #[test]
    fn test_pending_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(PendingStatus::Pending).unwrap(),
            serde_json::json!("pending")
        );
    }

    #[test]
    fn test_stats_apply_counts_each_delta() {
        let now = Utc::now();
        let mut stats = BotStats::default();
        stats.apply(StatsDelta::Succeeded, now);
        stats.apply(StatsDelta::Failed, now);
        stats.apply(StatsDelta::Queued, now);
        assert_eq!(stats.total_processed, 3);
        assert_eq!(stats.successful, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.last_activity, Some(now));
    }

    #[test]
    fn test_stats_dequeue_never_underflows() {
        let mut stats = BotStats::default();
        stats.apply(StatsDelta::Dequeued, Utc::now());
        assert_eq!(stats.pending, 0);
        assert_eq!(stats.total_processed, 0);
    }
}
