use serde::Serialize;
use thiserror::Error;

use crate::llm::LlmError;
use crate::schema::Violation;
use crate::types::BriefId;

pub type Result<T> = std::result::Result<T, BriefError>;

/// Machine-readable failure category exposed at the service boundary.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller input is malformed. Not retryable without fixing the input.
    InvalidRequest,
    /// No LLM credential and mock fallback disabled. Needs operator action.
    LlmNotConfigured,
    /// Network or HTTP failure reaching the LLM.
    TransportFailure,
    /// The LLM asked us to back off.
    RateLimited,
    /// The model answered with something that is not JSON.
    MalformedModelOutput,
    /// JSON that does not match the brief contract.
    SchemaViolation,
    NotFound,
    StorageFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::LlmNotConfigured => "llm_not_configured",
            ErrorKind::TransportFailure => "transport_failure",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::MalformedModelOutput => "malformed_model_output",
            ErrorKind::SchemaViolation => "schema_violation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::StorageFailure => "storage_failure",
        }
    }

    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::TransportFailure
                | ErrorKind::RateLimited
                | ErrorKind::MalformedModelOutput
                | ErrorKind::SchemaViolation
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum BriefError {
    #[error("Invalid request: {message}")]
    InvalidRequest {
        message: String,
        violations: Vec<Violation>,
    },

    #[error("LLM not configured: {0}")]
    LlmNotConfigured(String),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Model output is not valid JSON: {0}")]
    MalformedModelOutput(String),

    #[error("Brief failed schema validation with {} violation(s)", .0.len())]
    SchemaViolation(Vec<Violation>),

    #[error("Brief not found: {0}")]
    NotFound(String),

    #[error("Duplicate brief: {0}")]
    DuplicateBrief(BriefId),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::Error),

    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Storage operation error: {0}")]
    StorageOperation(#[from] redb::StorageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BriefError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        BriefError::InvalidRequest {
            message: message.into(),
            violations: Vec::new(),
        }
    }

    /// The taxonomy kind this error is reported as.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BriefError::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            BriefError::LlmNotConfigured(_) => ErrorKind::LlmNotConfigured,
            BriefError::Llm(e) => e.kind(),
            BriefError::MalformedModelOutput(_) => ErrorKind::MalformedModelOutput,
            BriefError::SchemaViolation(_) => ErrorKind::SchemaViolation,
            BriefError::NotFound(_) => ErrorKind::NotFound,
            BriefError::DuplicateBrief(_)
            | BriefError::Storage(_)
            | BriefError::Database(_)
            | BriefError::Table(_)
            | BriefError::Transaction(_)
            | BriefError::Commit(_)
            | BriefError::StorageOperation(_)
            | BriefError::Io(_)
            | BriefError::Serialization(_) => ErrorKind::StorageFailure,
        }
    }

    /// Field-level detail, present for request and schema failures.
    pub fn violations(&self) -> Option<&[Violation]> {
        match self {
            BriefError::InvalidRequest { violations, .. } if !violations.is_empty() => {
                Some(violations)
            }
            BriefError::SchemaViolation(violations) => Some(violations),
            _ => None,
        }
    }
}
