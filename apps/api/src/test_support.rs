// In-memory stand-ins for the trait seams, shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::generation::CoverLetterGenerator;
use crate::jobboard::{
    ApplicationPayload, JobBoard, JobBoardError, JobPosting, Session, SessionStep,
};
use crate::llm_client::{LlmError, TextGenerator};
use crate::models::config::{BotConfig, ChannelCredentials, Expertise};
use crate::models::records::{
    BotStats, ChannelJobLog, DisposalRecord, HistoryRecord, PendingApplicationRecord, StatsDelta,
};
use crate::settings::BotSettings;
use crate::store::{ApplicationStore, StoreError};
use crate::workflow::{ApplicationWorkflow, Notification, Notifier};

pub const GENERATED_LETTER: &str = "Dear hiring team, I build reliable backend systems.";

// ────────────────────────────────────────────────────────────────────────────
// Job board
// ────────────────────────────────────────────────────────────────────────────

pub enum Details {
    Found(JobPosting),
    Missing,
    Unavailable,
}

pub struct FakeBoard {
    pub auth_failure: Option<SessionStep>,
    pub details: Details,
    pub submit_error: Option<String>,
    pub lookups: Mutex<Vec<String>>,
    pub submissions: Mutex<Vec<ApplicationPayload>>,
}

impl FakeBoard {
    pub fn with_details(details: Details) -> Self {
        Self {
            auth_failure: None,
            details,
            submit_error: None,
            lookups: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
        }
    }

    pub fn approved() -> Self {
        Self::with_details(Details::Found(posting("approved", Some(7))))
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.lock().unwrap().len()
    }
}

/// A posting whose deadline is `deadline_days` from now.
pub fn posting(status: &str, deadline_days: Option<i64>) -> JobPosting {
    JobPosting {
        id: "job-42".to_string(),
        title: Some("Senior Rust Engineer".to_string()),
        approval_status: Some(status.to_string()),
        deadline: deadline_days.map(|d| Utc::now() + Duration::days(d)),
        description: Some("Build async services in Rust and Postgres.".to_string()),
        company: Some("Acme Labs".to_string()),
        job_type: None,
        location: None,
        experience_level: None,
    }
}

pub fn session() -> Session {
    Session {
        token: "token".to_string(),
        user_id: "user-1".to_string(),
        job_seeker_id: "seeker-1".to_string(),
        default_profile_id: "profile-1".to_string(),
        platform_id: "platform-bot".to_string(),
        profiles: Vec::new(),
    }
}

#[async_trait]
impl JobBoard for FakeBoard {
    async fn authenticate(&self) -> Result<Session, JobBoardError> {
        match self.auth_failure {
            Some(step) => Err(JobBoardError::session(step, "scripted failure")),
            None => Ok(session()),
        }
    }

    async fn fetch_job_details(
        &self,
        _session: &Session,
        job_id: &str,
    ) -> Result<Option<JobPosting>, JobBoardError> {
        self.lookups.lock().unwrap().push(job_id.to_string());
        match &self.details {
            Details::Found(posting) => Ok(Some(posting.clone())),
            Details::Missing => Ok(None),
            Details::Unavailable => Err(JobBoardError::Status {
                status: 503,
                body: String::new(),
            }),
        }
    }

    async fn submit_application(
        &self,
        _session: &Session,
        payload: &ApplicationPayload,
    ) -> Result<String, JobBoardError> {
        self.submissions.lock().unwrap().push(payload.clone());
        match &self.submit_error {
            Some(message) => Err(JobBoardError::GraphQl(message.clone())),
            None => Ok("app-1001".to_string()),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Text generation
// ────────────────────────────────────────────────────────────────────────────

/// Returns `reply` or, when it is `None`, fails like an exhausted quota.
pub struct ScriptedGenerator {
    pub reply: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => Err(LlmError::Api {
                status: 429,
                message: "quota exceeded".to_string(),
            }),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStore {
    pub config: Mutex<Option<BotConfig>>,
    pub pending: Mutex<HashMap<String, PendingApplicationRecord>>,
    pub history: Mutex<Vec<HistoryRecord>>,
    pub disposals: Mutex<Vec<DisposalRecord>>,
    pub channel_logs: Mutex<Vec<ChannelJobLog>>,
    pub stats: Mutex<BotStats>,
    /// Makes `put_history` fail.
    pub fail_history: AtomicBool,
    /// Makes `put_pending` and `delete_pending` fail.
    pub fail_pending: AtomicBool,
}

fn unavailable() -> StoreError {
    StoreError::Database(sqlx::Error::PoolTimedOut)
}

impl MemoryStore {
    pub fn history(&self) -> Vec<HistoryRecord> {
        self.history.lock().unwrap().clone()
    }

    pub fn pending_record(&self, job_id: &str) -> Option<PendingApplicationRecord> {
        self.pending.lock().unwrap().get(job_id).cloned()
    }

    pub fn stats(&self) -> BotStats {
        self.stats.lock().unwrap().clone()
    }

    pub fn break_history(&self) {
        self.fail_history.store(true, Ordering::SeqCst);
    }

    pub fn break_pending(&self) {
        self.fail_pending.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn get_config(&self) -> Result<Option<BotConfig>, StoreError> {
        Ok(self.config.lock().unwrap().clone())
    }

    async fn put_config(&self, config: &BotConfig) -> Result<(), StoreError> {
        *self.config.lock().unwrap() = Some(config.clone());
        Ok(())
    }

    async fn set_channel_name(&self, name: &str) -> Result<(), StoreError> {
        let mut config = self.config.lock().unwrap();
        config.get_or_insert_with(BotConfig::default).channel_name = Some(name.to_string());
        Ok(())
    }

    async fn put_pending(&self, record: &PendingApplicationRecord) -> Result<(), StoreError> {
        if self.fail_pending.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.pending
            .lock()
            .unwrap()
            .insert(record.job_id.clone(), record.clone());
        Ok(())
    }

    async fn get_pending(&self, job_id: &str) -> Result<Option<PendingApplicationRecord>, StoreError> {
        Ok(self.pending_record(job_id))
    }

    async fn list_pending(&self) -> Result<Vec<PendingApplicationRecord>, StoreError> {
        Ok(self.pending.lock().unwrap().values().cloned().collect())
    }

    async fn delete_pending(&self, job_id: &str) -> Result<bool, StoreError> {
        if self.fail_pending.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self.pending.lock().unwrap().remove(job_id).is_some())
    }

    async fn put_history(&self, record: &HistoryRecord) -> Result<(), StoreError> {
        if self.fail_history.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let mut history = self.history.lock().unwrap();
        history.retain(|r| r.job_id != record.job_id);
        history.push(record.clone());
        Ok(())
    }

    async fn list_history(&self, limit: i64) -> Result<Vec<HistoryRecord>, StoreError> {
        let history = self.history.lock().unwrap();
        Ok(history
            .iter()
            .rev()
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn put_disposal(&self, record: &DisposalRecord) -> Result<(), StoreError> {
        self.disposals.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn put_channel_log(&self, log: &ChannelJobLog) -> Result<(), StoreError> {
        self.channel_logs.lock().unwrap().push(log.clone());
        Ok(())
    }

    async fn record_stats(&self, delta: StatsDelta) -> Result<(), StoreError> {
        self.stats.lock().unwrap().apply(delta, Utc::now());
        Ok(())
    }

    async fn get_stats(&self) -> Result<BotStats, StoreError> {
        Ok(self.stats())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Notifier
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Assembly
// ────────────────────────────────────────────────────────────────────────────

/// Three keywords, minimum three, all credentials present.
pub fn bot_config(auto_apply: Option<bool>) -> BotConfig {
    BotConfig {
        keywords: vec!["rust".to_string(), "remote".to_string(), "backend".to_string()],
        minimum_keyword_matches: Some(3),
        auto_apply,
        ai_prompt: None,
        expertise: Expertise {
            skills: vec!["Rust".to_string(), "PostgreSQL".to_string()],
            experience: vec!["5 years building APIs".to_string()],
            education: None,
            languages: vec!["English".to_string()],
            additional_info: None,
        },
        channel_name: None,
        env: ChannelCredentials {
            channel_id: Some("1234567890".to_string()),
            telegram_username: Some("applicant".to_string()),
            telegram_init_data: Some("user=%7B%22id%22%3A42%7D".to_string()),
            target_user_id: Some("99".to_string()),
            llm_api_key: Some("sk-test".to_string()),
            bot_token: Some("123:abc".to_string()),
        },
    }
}

pub struct Harness {
    pub board: Arc<FakeBoard>,
    pub generator: Arc<ScriptedGenerator>,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub workflow: ApplicationWorkflow,
}

impl Harness {
    pub fn new(config: BotConfig, board: FakeBoard, generator: ScriptedGenerator) -> Self {
        let settings = Arc::new(BotSettings::resolve(config, |_| None));
        let board = Arc::new(board);
        let generator = Arc::new(generator);
        let store = Arc::new(MemoryStore::default());
        let notifier = Arc::new(RecordingNotifier::default());

        let cover_letters = CoverLetterGenerator::new(
            generator.clone(),
            settings.prompt_template.clone(),
            settings.expertise.clone(),
        );
        let workflow = ApplicationWorkflow::new(
            settings,
            board.clone(),
            cover_letters,
            store.clone(),
            notifier.clone(),
        );

        Self {
            board,
            generator,
            store,
            notifier,
            workflow,
        }
    }

    /// Auto-apply on, approved job, working generator.
    pub fn standard() -> Self {
        Self::new(
            bot_config(Some(true)),
            FakeBoard::approved(),
            ScriptedGenerator::replying(GENERATED_LETTER),
        )
    }
}
