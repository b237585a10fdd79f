use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by plan simulation, projection and storage.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    #[error("unknown time zone '{name}': {source}")]
    TimeZone {
        name: String,
        #[source]
        source: jiff::Error,
    },
    #[error("date arithmetic failed: {0}")]
    Date(#[from] jiff::Error),
    #[error("storage error at '{path}': {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("configuration error: {message}")]
    Config { message: String },
    #[error("plan '{plan_id}' not found for user '{user_id}'")]
    PlanNotFound { user_id: String, plan_id: String },
}

impl PlanError {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PlanError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PlanError::Storage {
            path: path.into(),
            source,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        PlanError::Config {
            message: message.into(),
        }
    }
}

/// Failures of the external text-generation call. These never escape plan
/// generation; they select the fallback template instead.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("text generation is not configured: set OPENAI_API_KEY")]
    NotConfigured,
    #[error("generation request failed: {0}")]
    Request(String),
    #[error("generation API error: {status} {detail}")]
    Api { status: u16, detail: String },
    #[error("generation response missing content")]
    MissingContent,
    #[error("generation response parse failed: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, PlanError>;
