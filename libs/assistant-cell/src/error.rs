use thiserror::Error;

use shared_models::error::AppError;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Invalid response from upstream: {0}")]
    InvalidResponse(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),
}

impl From<AssistantError> for AppError {
    fn from(err: AssistantError) -> Self {
        match err {
            AssistantError::Validation(msg) => AppError::ValidationError(msg),
            other => AppError::ExternalService(other.to_string()),
        }
    }
}
