use thiserror::Error;

use super::session::SessionStep;

#[derive(Debug, Error)]
pub enum JobBoardError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Error message(s) returned in a GraphQL `errors` array.
    #[error("{0}")]
    GraphQl(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("{step} ({detail})")]
    Session { step: SessionStep, detail: String },
}

impl JobBoardError {
    pub fn session(step: SessionStep, detail: impl Into<String>) -> Self {
        JobBoardError::Session {
            step,
            detail: detail.into(),
        }
    }

    /// Transport failures and server-side errors are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            JobBoardError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            JobBoardError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Remote rejection text, without the wrapper prefix.
    pub fn remote_message(&self) -> String {
        match self {
            JobBoardError::GraphQl(message) => message.clone(),
            JobBoardError::Status { status, body } if body.is_empty() => format!("HTTP {status}"),
            JobBoardError::Status { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }
}
