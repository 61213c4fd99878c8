use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info, warn};

use super::error::JobBoardError;
use super::queries::{self, roles};
use super::session::{telegram_id_from_init_data, token_subject, Session, SessionStep};
use super::types::{
    ApplicationPayload, ApplyData, GraphQlRequest, GraphQlResponse, JobDetailsData, JobPosting,
    JobSeekersData, PlatformsData, ProfilesData, UsersData, ValidateResponse,
};
use super::JobBoard;
use crate::config::{JobBoardSettings, RetryPolicy};

const MINIAPP_ORIGIN: &str = "https://miniapp.afriworket.com";

/// HTTP client for the job board's auth endpoint and GraphQL API.
///
/// Holds no per-session state: `authenticate` returns a fresh `Session` for the caller to
/// pass back into the other calls.
#[derive(Clone)]
pub struct JobBoardClient {
    http: Client,
    graphql_url: String,
    auth_url: String,
    init_data: String,
    retry: RetryPolicy,
}

impl JobBoardClient {
    pub fn new(settings: &JobBoardSettings, init_data: impl Into<String>) -> Result<Self, JobBoardError> {
        let mut builder = Client::builder().timeout(settings.timeout);
        if settings.insecure_tls {
            warn!(
                "TLS certificate validation is DISABLED for {} (JOBBOARD_INSECURE_TLS). Local testing only.",
                settings.base_url
            );
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            http: builder.build()?,
            graphql_url: format!("{}/v1/graphql", settings.base_url.trim_end_matches('/')),
            auth_url: settings.auth_url.clone(),
            init_data: init_data.into(),
            retry: settings.retry,
        })
    }

    /// Exchanges the Telegram identity for a bearer token.
    async fn validate_request(&self, telegram_id: &str) -> Result<String, JobBoardError> {
        let response = self
            .http
            .post(&self.auth_url)
            .header("accept", "application/json")
            .header("origin", MINIAPP_ORIGIN)
            .header("referer", format!("{MINIAPP_ORIGIN}/"))
            .header("x-bot-type", "APPLICANT")
            .header("x-telegram-init-data", &self.init_data)
            .json(&json!({ "telegram_id": telegram_id }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JobBoardError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ValidateResponse = response.json().await?;
        body.token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| JobBoardError::Decode("validate-request returned no token".to_string()))
    }

    /// Runs a read-only operation under the configured retry policy.
    async fn query<T: DeserializeOwned>(
        &self,
        operation_name: &str,
        query: &str,
        variables: serde_json::Value,
        role: &str,
        token: Option<&str>,
    ) -> Result<T, JobBoardError> {
        let mut last_error: Option<JobBoardError> = None;

        for attempt in 0..self.retry.max_attempts {
            if attempt > 0 {
                let delay = self.retry.delay_before(attempt);
                warn!(
                    "{operation_name} attempt {attempt} failed, retrying after {}ms...",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            match self
                .execute(operation_name, query, variables.clone(), role, token)
                .await
            {
                Ok(data) => return Ok(data),
                Err(e) if e.is_transient() => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            JobBoardError::Decode(format!("{operation_name} was never attempted"))
        }))
    }

    /// One GraphQL round-trip. Errors in the response body become `GraphQl`.
    async fn execute<T: DeserializeOwned>(
        &self,
        operation_name: &str,
        query: &str,
        variables: serde_json::Value,
        role: &str,
        token: Option<&str>,
    ) -> Result<T, JobBoardError> {
        let payload = GraphQlRequest {
            operation_name,
            query,
            variables,
        };

        let mut request = self
            .http
            .post(&self.graphql_url)
            .header("accept", "application/graphql-response+json, application/json")
            .header("origin", MINIAPP_ORIGIN)
            .header("referer", format!("{MINIAPP_ORIGIN}/"))
            .header("x-hasura-role", role)
            .json(&payload);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JobBoardError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: GraphQlResponse<T> = response.json().await?;
        if !body.errors.is_empty() {
            let messages: Vec<String> = body.errors.into_iter().map(|e| e.message).collect();
            return Err(JobBoardError::GraphQl(messages.join("; ")));
        }

        body.data
            .ok_or_else(|| JobBoardError::Decode(format!("{operation_name} returned no data")))
    }
}

fn at_step(step: SessionStep) -> impl Fn(JobBoardError) -> JobBoardError {
    move |e| JobBoardError::session(step, e.to_string())
}

#[async_trait]
impl JobBoard for JobBoardClient {
    async fn authenticate(&self) -> Result<Session, JobBoardError> {
        // 1. Token
        let telegram_id = telegram_id_from_init_data(&self.init_data).ok_or_else(|| {
            JobBoardError::session(SessionStep::ValidateRequest, "init data carries no user id")
        })?;
        let token = self
            .validate_request(&telegram_id)
            .await
            .map_err(at_step(SessionStep::ValidateRequest))?;
        if let Some(subject) = token_subject(&token) {
            debug!("Token issued for subject {subject}");
        }

        // 2. User record
        let users: UsersData = self
            .query(
                "FetchUserByTelegramId",
                queries::FETCH_USER_BY_TELEGRAM_ID,
                json!({ "telegram_id": telegram_id }),
                roles::TEMPORARY_USER,
                Some(&token),
            )
            .await
            .map_err(at_step(SessionStep::ResolveUser))?;
        let user_id = users
            .users
            .into_iter()
            .next()
            .map(|u| u.id)
            .ok_or_else(|| JobBoardError::session(SessionStep::ResolveUser, "no matching user"))?;

        // 3. Job seeker
        let seekers: JobSeekersData = self
            .query(
                "js_id",
                queries::FETCH_JOB_SEEKER,
                json!({ "user_id": user_id }),
                roles::USER,
                Some(&token),
            )
            .await
            .map_err(at_step(SessionStep::ResolveJobSeeker))?;
        let seeker = seekers.job_seekers.into_iter().next().ok_or_else(|| {
            JobBoardError::session(SessionStep::ResolveJobSeeker, "no job seeker for user")
        })?;

        // 4. Profiles
        let profiles: ProfilesData = self
            .query(
                "FetchJobSeekerProfilesById",
                queries::FETCH_JOB_SEEKER_PROFILES,
                json!({ "job_seeker_id": seeker.id }),
                roles::JOB_SEEKER,
                Some(&token),
            )
            .await
            .map_err(at_step(SessionStep::ResolveProfiles))?;
        let profiles = profiles
            .job_seekers_by_pk
            .filter(|p| !p.profiles.is_empty())
            .ok_or_else(|| JobBoardError::session(SessionStep::ResolveProfiles, "no profiles"))?;
        let default_profile_id = profiles
            .default_profile_id
            .or(seeker.default_profile_id)
            .or_else(|| profiles.profiles.first().map(|p| p.id.clone()))
            .ok_or_else(|| {
                JobBoardError::session(SessionStep::ResolveProfiles, "no default profile")
            })?;

        // 5. Origin platform
        let platforms: PlatformsData = self
            .query(
                "getPlatformId",
                queries::FETCH_PLATFORM_ID,
                json!({}),
                roles::JOB_SEEKER,
                Some(&token),
            )
            .await
            .map_err(at_step(SessionStep::ResolvePlatform))?;
        let platform_id = platforms
            .platforms
            .into_iter()
            .next()
            .map(|p| p.id)
            .ok_or_else(|| JobBoardError::session(SessionStep::ResolvePlatform, "no BOT platform"))?;

        info!(
            "Job board session ready (job seeker {}, {} profile(s))",
            seeker.id,
            profiles.profiles.len()
        );

        Ok(Session {
            token,
            user_id,
            job_seeker_id: seeker.id,
            default_profile_id,
            platform_id,
            profiles: profiles.profiles,
        })
    }

    async fn fetch_job_details(
        &self,
        session: &Session,
        job_id: &str,
    ) -> Result<Option<JobPosting>, JobBoardError> {
        let data: JobDetailsData = self
            .query(
                "viewDetails",
                queries::VIEW_JOB_DETAILS,
                json!({ "id": job_id }),
                roles::USER,
                Some(&session.token),
            )
            .await?;

        Ok(data.view_job_details.into_iter().next().map(JobPosting::from))
    }

    /// Never retried: a repeated mutation could land twice.
    async fn submit_application(
        &self,
        session: &Session,
        payload: &ApplicationPayload,
    ) -> Result<String, JobBoardError> {
        let data: ApplyData = self
            .execute(
                "ApplyToJob",
                queries::APPLY_TO_JOB,
                payload.to_variables(),
                roles::JOB_SEEKER,
                Some(&session.token),
            )
            .await?;

        data.apply_to_job
            .and_then(|r| r.application_id)
            .ok_or_else(|| JobBoardError::Decode("apply_to_job returned no application id".to_string()))
    }
}
