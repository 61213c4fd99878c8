//! Job board client: the only place that talks to the job board's API.
//!
//! The workflow depends on the `JobBoard` trait so tests can substitute a scripted board.
//! `JobBoardClient` is the HTTP implementation.

use async_trait::async_trait;

pub mod client;
pub mod error;
pub mod queries;
pub mod session;
pub mod types;

pub use client::JobBoardClient;
pub use error::JobBoardError;
pub use session::{Session, SessionStep};
pub use types::{ApplicationPayload, JobPosting};

#[async_trait]
pub trait JobBoard: Send + Sync {
    /// Runs the full session bootstrap: token, user, job seeker, profiles, platform.
    /// A failure names the step that failed.
    async fn authenticate(&self) -> Result<Session, JobBoardError>;

    /// `Ok(None)` when the board knows no such job.
    async fn fetch_job_details(
        &self,
        session: &Session,
        job_id: &str,
    ) -> Result<Option<JobPosting>, JobBoardError>;

    /// Returns the new application id.
    async fn submit_application(
        &self,
        session: &Session,
        payload: &ApplicationPayload,
    ) -> Result<String, JobBoardError>;
}
