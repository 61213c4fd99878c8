//! Application workflow: takes one channel post from "received" to a submitted
//! application, a queued approval, or a reported failure.
//!
//! Every run resolves into a `WorkflowReport`; nothing escapes to the caller. Each run
//! authenticates its own `Session`, so overlapping runs for different jobs share only
//! the read-only settings and the store.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::generation::prompts::{PLACEHOLDER_COVER_LETTER, UNKNOWN_JOB_DESCRIPTION};
use crate::generation::CoverLetterGenerator;
use crate::intake::{extract_job_reference, JobReference};
use crate::jobboard::{ApplicationPayload, JobBoard, JobPosting, Session};
use crate::models::message::ChannelMessage;
use crate::models::records::{
    HistoryRecord, Outcome, PendingApplicationRecord, PendingStatus, StatsDelta, SubmissionMethod,
};
use crate::settings::BotSettings;
use crate::store::ApplicationStore;

pub mod eligibility;
pub mod notify;
pub mod outcome;


pub use eligibility::{check_eligibility, Eligibility};
pub use notify::{Notification, Notifier};
pub use outcome::{
    classify_submission_error, ApplicationResult, ErrorKind, Route, WorkflowReport, WorkflowState,
    ALREADY_APPLIED,
};

/// Body of an operator's approval from the dashboard.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualApplyRequest {
    pub job_id: String,
    #[serde(default)]
    pub job_description: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    /// Operator-edited letter; replaces the generated one when non-blank.
    #[serde(default)]
    pub manual_cover_letter: Option<String>,
}

/// What the workflow knows about a job after the eligibility step.
struct JobContext {
    job: JobReference,
    title: Option<String>,
    company: Option<String>,
    description: String,
}

#[derive(Clone)]
pub struct ApplicationWorkflow {
    settings: Arc<BotSettings>,
    job_board: Arc<dyn JobBoard>,
    cover_letters: CoverLetterGenerator,
    store: Arc<dyn ApplicationStore>,
    notifier: Arc<dyn Notifier>,
}

impl ApplicationWorkflow {
    pub fn new(
        settings: Arc<BotSettings>,
        job_board: Arc<dyn JobBoard>,
        cover_letters: CoverLetterGenerator,
        store: Arc<dyn ApplicationStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            settings,
            job_board,
            cover_letters,
            store,
            notifier,
        }
    }

    pub fn settings(&self) -> &BotSettings {
        &self.settings
    }

    // ────────────────────────────────────────────────────────────────────────
    // Channel posts
    // ────────────────────────────────────────────────────────────────────────

    /// Runs one channel post through the workflow. Never fails: unexpected errors are
    /// logged, reported to the operator, and recorded as `ErrorKind::Unknown`.
    pub async fn process_message(&self, message: &ChannelMessage) -> WorkflowReport {
        let mut report = WorkflowReport::default();

        if let Err(e) = self.try_process(message, &mut report).await {
            let job_id = report
                .job
                .as_ref()
                .map(JobReference::id)
                .unwrap_or_else(|| "unknown".to_string());
            error!(job_id = %job_id, "Workflow aborted by unexpected error: {e:#}");

            let text = e.to_string();
            report.result = Some(ApplicationResult::failed(ErrorKind::Unknown, text.clone()));
            advance(&mut report, &job_id, WorkflowState::Failed);
            self.bump(StatsDelta::Failed).await;
            self.send(&Notification::Failed {
                job_id,
                job_title: None,
                error: text,
            })
            .await;
        }

        report
    }

    async fn try_process(
        &self,
        message: &ChannelMessage,
        report: &mut WorkflowReport,
    ) -> anyhow::Result<()> {
        report.states.push(WorkflowState::Received);

        let Some(job) = extract_job_reference(message) else {
            info!("No job id in post, nothing to do");
            return Ok(());
        };
        let job_id = job.id();
        report.job = Some(job.clone());

        let keywords = self.settings.matcher.evaluate(&message.message);
        report.keywords = Some(keywords.clone());
        if !keywords.matched {
            info!(
                job_id = %job_id,
                "Post not relevant ({} of {} keywords required)",
                keywords.match_count,
                self.settings.matcher.minimum_matches()
            );
            return Ok(());
        }
        info!(job_id = %job_id, "Relevant post, matched {:?}", keywords.found_keywords);

        if let Some(missing) = self.settings.missing_credential() {
            let result = ApplicationResult::failed(ErrorKind::Configuration, missing.message());
            self.finish_failed(report, &job_id, result, false).await;
            return Ok(());
        }

        let session = match self.job_board.authenticate().await {
            Ok(session) => session,
            Err(e) => {
                let result = ApplicationResult::failed(ErrorKind::AuthFailure, e.to_string());
                self.finish_failed(report, &job_id, result, true).await;
                return Ok(());
            }
        };
        advance(report, &job_id, WorkflowState::Authenticated);

        let context = match self.assess(&session, job, message).await {
            Ok(context) => context,
            Err(result) => {
                self.finish_failed(report, &job_id, result, true).await;
                return Ok(());
            }
        };
        advance(report, &job_id, WorkflowState::Eligible);

        let route = if !self.settings.auto_apply || context.job.is_placeholder() {
            Route::ManualApproval
        } else {
            Route::Automatic
        };
        report.route = Some(route);
        info!(job_id = %job_id, "Routing: {route:?}");

        let cover_letter = if context.job.is_placeholder() {
            PLACEHOLDER_COVER_LETTER.to_string()
        } else {
            self.cover_letters.generate(&context.description).await
        };
        advance(report, &job_id, WorkflowState::CoverLetterReady);

        match route {
            Route::ManualApproval => {
                self.queue_for_approval(report, &context, keywords.found_keywords, cover_letter)
                    .await
            }
            Route::Automatic => {
                self.submit_automatically(report, &session, &context, &cover_letter)
                    .await;
                Ok(())
            }
        }
    }

    /// Looks the job up (real jobs only) and applies the eligibility rules.
    async fn assess(
        &self,
        session: &Session,
        job: JobReference,
        message: &ChannelMessage,
    ) -> Result<JobContext, ApplicationResult> {
        let posting = self.lookup(session, &job).await;

        let verdict = check_eligibility(&job, posting.as_ref(), Utc::now());
        if let Some((kind, reason)) = verdict.rejection() {
            warn!(job_id = %job, "Job not eligible: {reason}");
            let title = posting.as_ref().and_then(|p| p.title.clone());
            let company = posting.as_ref().and_then(|p| p.company.clone());
            return Err(ApplicationResult::failed(kind, reason).with_job(title, company));
        }
        if verdict == Eligibility::BestEffort {
            info!(job_id = %job, "Proceeding best-effort without job board details");
        }

        let headline = Some(message.headline()).filter(|h| !h.is_empty());
        let post_text = message.description();
        Ok(JobContext {
            title: posting.as_ref().and_then(|p| p.title.clone()).or(headline),
            company: posting.as_ref().and_then(|p| p.company.clone()),
            description: best_description(posting.as_ref(), Some(post_text.as_str())),
            job,
        })
    }

    /// Job board details, or `None` when the job is a placeholder or the lookup fails.
    async fn lookup(&self, session: &Session, job: &JobReference) -> Option<JobPosting> {
        let JobReference::Real(id) = job else {
            return None;
        };
        match self.job_board.fetch_job_details(session, id).await {
            Ok(Some(posting)) => Some(posting),
            Ok(None) => {
                warn!(job_id = %id, "Job board has no details for this job");
                None
            }
            Err(e) => {
                warn!(job_id = %id, "Job details lookup failed: {e}");
                None
            }
        }
    }

    async fn queue_for_approval(
        &self,
        report: &mut WorkflowReport,
        context: &JobContext,
        matched_keywords: Vec<String>,
        cover_letter: String,
    ) -> anyhow::Result<()> {
        let job_id = context.job.id();
        let record = PendingApplicationRecord {
            job_id: job_id.clone(),
            job_description: context.description.clone(),
            job_title: context.title.clone(),
            company_name: context.company.clone(),
            matched_keywords,
            cover_letter,
            status: PendingStatus::Pending,
            timestamp: Utc::now(),
        };
        self.store.put_pending(&record).await?;
        advance(report, &job_id, WorkflowState::QueuedForApproval);
        self.bump(StatsDelta::Queued).await;

        report.result = Some(ApplicationResult {
            success: true,
            job_title: context.title.clone(),
            company_name: context.company.clone(),
            ..Default::default()
        });

        self.send(&Notification::ApprovalRequired {
            job_id: job_id.clone(),
            job_title: context.title.clone(),
            company_name: context.company.clone(),
        })
        .await;
        advance(report, &job_id, WorkflowState::Notified);
        Ok(())
    }

    async fn submit_automatically(
        &self,
        report: &mut WorkflowReport,
        session: &Session,
        context: &JobContext,
        cover_letter: &str,
    ) {
        let job_id = context.job.id();
        let result = self.submit(session, &job_id, cover_letter).await;
        let result = result.with_job(context.title.clone(), context.company.clone());

        if result.success {
            advance(report, &job_id, WorkflowState::Submitted);
        }
        self.record_history(&job_id, &result, SubmissionMethod::Auto)
            .await;
        self.bump(stats_delta(&result)).await;

        let notification = if result.success {
            Notification::Submitted {
                job_id: job_id.clone(),
                job_title: result.job_title.clone(),
                company_name: result.company_name.clone(),
                application_id: result.application_id.clone(),
            }
        } else {
            Notification::Failed {
                job_id: job_id.clone(),
                job_title: result.job_title.clone(),
                error: result.error.clone().unwrap_or_default(),
            }
        };
        report.result = Some(result);
        self.send(&notification).await;
        advance(report, &job_id, WorkflowState::Notified);
    }

    /// Single submission attempt; failures are classified, never retried.
    async fn submit(&self, session: &Session, job_id: &str, cover_letter: &str) -> ApplicationResult {
        let payload = ApplicationPayload::new(
            job_id,
            session.default_profile_id.clone(),
            cover_letter,
            session.platform_id.clone(),
            None,
            self.settings.telegram_username.clone(),
        );

        info!(job_id = %job_id, "Submitting application");
        match self.job_board.submit_application(session, &payload).await {
            Ok(application_id) => {
                info!(job_id = %job_id, "Application submitted: {application_id}");
                ApplicationResult::succeeded(application_id, None, None)
            }
            Err(e) => {
                let (kind, message) = classify_submission_error(&e);
                warn!(job_id = %job_id, "Submission rejected ({kind:?}): {e}");
                ApplicationResult::failed(kind, message)
            }
        }
    }

    /// Ends a run before submission: history (unless it is a config problem), stats,
    /// and a failure notification.
    async fn finish_failed(
        &self,
        report: &mut WorkflowReport,
        job_id: &str,
        result: ApplicationResult,
        write_history: bool,
    ) {
        let error = result.error.clone().unwrap_or_default();
        warn!(job_id = %job_id, "Workflow failed: {error}");

        if write_history {
            self.record_history(job_id, &result, SubmissionMethod::Auto)
                .await;
        }
        self.bump(StatsDelta::Failed).await;
        self.send(&Notification::Failed {
            job_id: job_id.to_string(),
            job_title: result.job_title.clone(),
            error,
        })
        .await;

        report.result = Some(result);
        advance(report, job_id, WorkflowState::Failed);
    }

    // ────────────────────────────────────────────────────────────────────────
    // Manual approval
    // ────────────────────────────────────────────────────────────────────────

    /// Submits a queued application on the operator's behalf.
    ///
    /// Whatever the outcome, the pending record is removed and a manual history record
    /// is written. Those writes happen after the job board has answered, so a store
    /// failure is logged and never overrides the submission result.
    pub async fn manual_apply(&self, request: &ManualApplyRequest) -> ApplicationResult {
        let job_id = request.job_id.trim().to_string();
        info!(job_id = %job_id, "Manual application requested");

        let result = self
            .manual_submission(&job_id, request)
            .await
            .with_defaults(request.job_title.clone(), request.company_name.clone());

        match self.store.delete_pending(&job_id).await {
            Ok(true) => self.bump(StatsDelta::Dequeued).await,
            Ok(false) => warn!(job_id = %job_id, "No pending record to remove"),
            Err(e) => error!(job_id = %job_id, "Failed to remove pending record: {e}"),
        }
        self.record_history(&job_id, &result, SubmissionMethod::Manual)
            .await;
        self.bump(stats_delta(&result)).await;

        result
    }

    async fn manual_submission(&self, job_id: &str, request: &ManualApplyRequest) -> ApplicationResult {
        let job = JobReference::parse(job_id);
        if job.is_placeholder() {
            return ApplicationResult::failed(
                ErrorKind::SubmissionFailure,
                "This post had no job link; apply on the job board directly",
            );
        }
        if let Some(missing) = self.settings.missing_credential() {
            return ApplicationResult::failed(ErrorKind::Configuration, missing.message());
        }

        let session = match self.job_board.authenticate().await {
            Ok(session) => session,
            Err(e) => return ApplicationResult::failed(ErrorKind::AuthFailure, e.to_string()),
        };

        let posting = self.lookup(&session, &job).await;
        let title = posting.as_ref().and_then(|p| p.title.clone());
        let company = posting.as_ref().and_then(|p| p.company.clone());
        let verdict = check_eligibility(&job, posting.as_ref(), Utc::now());
        if let Some((kind, reason)) = verdict.rejection() {
            return ApplicationResult::failed(kind, reason).with_job(title, company);
        }

        let edited = request
            .manual_cover_letter
            .as_deref()
            .map(str::trim)
            .filter(|letter| !letter.is_empty());
        let cover_letter = match edited {
            Some(letter) => letter.to_string(),
            None => {
                let description = best_description(posting.as_ref(), request.job_description.as_deref());
                self.cover_letters.generate(&description).await
            }
        };

        self.submit(&session, job_id, &cover_letter)
            .await
            .with_job(title, company)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Side effects
    // ────────────────────────────────────────────────────────────────────────

    /// Written once the outcome is known; a failed write is logged, not propagated.
    async fn record_history(&self, job_id: &str, result: &ApplicationResult, method: SubmissionMethod) {
        let record = HistoryRecord {
            job_id: job_id.to_string(),
            job_title: result.job_title.clone(),
            company_name: result.company_name.clone(),
            status: Outcome::from_success(result.success),
            error: result.error.clone(),
            timestamp: Utc::now(),
            method,
        };
        if let Err(e) = self.store.put_history(&record).await {
            error!(job_id = %job_id, "Failed to write history record: {e}");
        }
    }

    /// Stats are advisory; a failed update is logged and dropped.
    async fn bump(&self, delta: StatsDelta) {
        if let Err(e) = self.store.record_stats(delta).await {
            warn!("Failed to update stats ({delta:?}): {e}");
        }
    }

    async fn send(&self, notification: &Notification) {
        if let Err(e) = self.notifier.notify(notification).await {
            warn!(job_id = %notification.job_id(), "Notification not delivered: {e:#}");
        }
    }
}

impl ApplicationResult {
    /// Fills title and company from the request when the job board gave none.
    fn with_defaults(mut self, job_title: Option<String>, company_name: Option<String>) -> Self {
        self.job_title = self.job_title.or(job_title);
        self.company_name = self.company_name.or(company_name);
        self
    }
}

fn advance(report: &mut WorkflowReport, job_id: &str, state: WorkflowState) {
    info!(job_id = %job_id, state = %state, "Workflow state");
    report.states.push(state);
}

fn stats_delta(result: &ApplicationResult) -> StatsDelta {
    if result.success {
        StatsDelta::Succeeded
    } else {
        StatsDelta::Failed
    }
}

/// The job board's description, else the post text, else a generic label.
fn best_description(posting: Option<&JobPosting>, fallback: Option<&str>) -> String {
    let usable = |text: &&str| !text.trim().is_empty();
    posting
        .and_then(|p| p.description.as_deref())
        .filter(usable)
        .or(fallback.filter(usable))
        .map(|text| text.trim().to_string())
        .unwrap_or_else(|| UNKNOWN_JOB_DESCRIPTION.to_string())
}
