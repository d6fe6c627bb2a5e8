//! Query request/result types and the AI service boundary.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use uuid::Uuid;

use crate::error::NexusError;

/// Text delivered when the service answers with zero candidates.
pub const NO_RESPONSE: &str = "no response";

/// Raw answer from an [`AiService`]: zero or more candidate texts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AiResponse {
    pub candidates: Vec<String>,
}

impl AiResponse {
    pub fn new(candidates: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }

    pub fn first_text(&self) -> Option<&str> {
        self.candidates.first().map(String::as_str)
    }

    /// The first candidate, or [`NO_RESPONSE`] if there is none.
    pub fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .unwrap_or_else(|| NO_RESPONSE.to_owned())
    }
}

/// Failure kinds at the AI service boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// HTTP 429. The only retryable kind.
    #[error("rate limited by the AI service")]
    RateLimited,

    /// No answer within the request timeout.
    #[error("request timed out")]
    Timeout,

    /// The service answered with something that is not a valid response.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Anything else (connection refused, HTTP 5xx, missing key).
    #[error("{0}")]
    Other(String),
}

impl QueryError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

impl From<QueryError> for NexusError {
    fn from(error: QueryError) -> Self {
        if error.is_retryable() {
            NexusError::TransientNetwork(error.to_string())
        } else {
            NexusError::TerminalNetwork(error.to_string())
        }
    }
}

/// One user submission. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub id: Uuid,
    pub text: String,
    pub submitted_at: DateTime<Local>,
}

impl QueryRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            submitted_at: Local::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPayload {
    Success(String),
    Failure(QueryError),
}

/// The single terminal outcome of a [`QueryRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub request_id: Uuid,
    pub payload: QueryPayload,
    /// Attempts made after the first one.
    pub retries_used: u32,
}

impl QueryResult {
    pub fn is_success(&self) -> bool {
        matches!(self.payload, QueryPayload::Success(_))
    }
}

/// Remote text-generation service.
#[async_trait]
pub trait AiService: Send + Sync {
    async fn query(&self, text: &str) -> Result<AiResponse, QueryError>;
}
