use std::fmt;

use serde::{Deserialize, Serialize};

use crate::intake::{JobReference, KeywordMatchResult};
use crate::jobboard::JobBoardError;

/// Message the operator sees when the job board reports a duplicate application.
pub const ALREADY_APPLIED: &str = "You have already applied to this job.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Received,
    Authenticated,
    Eligible,
    CoverLetterReady,
    Submitted,
    QueuedForApproval,
    Notified,
    Failed,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowState::Received => "received",
            WorkflowState::Authenticated => "authenticated",
            WorkflowState::Eligible => "eligible",
            WorkflowState::CoverLetterReady => "cover_letter_ready",
            WorkflowState::Submitted => "submitted",
            WorkflowState::QueuedForApproval => "queued_for_approval",
            WorkflowState::Notified => "notified",
            WorkflowState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Automatic,
    ManualApproval,
}

/// Why a run did not end in a submitted application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Duplicate,
    NotApproved,
    Expired,
    AuthFailure,
    GenerationFailure,
    SubmissionFailure,
    Configuration,
    Unknown,
}

/// Classifies a failed submission.
///
/// The job board only signals duplicates through free text, so "uniqueness" anywhere in
/// the message (any case) is read as an existing application. This breaks silently if
/// the remote wording changes.
pub fn classify_submission_error(error: &JobBoardError) -> (ErrorKind, String) {
    let message = error.remote_message();
    if message.to_lowercase().contains("uniqueness") {
        (ErrorKind::Duplicate, ALREADY_APPLIED.to_string())
    } else {
        (
            ErrorKind::SubmissionFailure,
            format!("Submission failed: {message}"),
        )
    }
}

/// Outcome of one application attempt, as reported to the operator and the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
}

impl ApplicationResult {
    pub fn succeeded(
        application_id: String,
        job_title: Option<String>,
        company_name: Option<String>,
    ) -> Self {
        Self {
            success: true,
            application_id: Some(application_id),
            job_title,
            company_name,
            ..Default::default()
        }
    }

    pub fn failed(kind: ErrorKind, error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            error_kind: Some(kind),
            ..Default::default()
        }
    }

    pub fn with_job(mut self, job_title: Option<String>, company_name: Option<String>) -> Self {
        self.job_title = job_title;
        self.company_name = company_name;
        self
    }
}

/// Everything one message run did, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowReport {
    pub job: Option<JobReference>,
    pub keywords: Option<KeywordMatchResult>,
    pub route: Option<Route>,
    pub states: Vec<WorkflowState>,
    pub result: Option<ApplicationResult>,
}

impl WorkflowReport {
    pub fn final_state(&self) -> Option<WorkflowState> {
        self.states.last().copied()
    }

    pub fn reached(&self, state: WorkflowState) -> bool {
        self.states.contains(&state)
    }

    /// Nothing to do: no job id, or the post is not relevant.
    pub fn is_ignored(&self) -> bool {
        self.final_state() == Some(WorkflowState::Received)
    }

    /// Short label for logs: the last state, or "ignored".
    pub fn outcome_label(&self) -> String {
        if self.is_ignored() {
            "ignored".to_string()
        } else {
            self.final_state()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unknown".to_string())
        }
    }
}
