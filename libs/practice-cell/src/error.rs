use thiserror::Error;

use shared_models::error::AppError;

#[derive(Error, Debug, PartialEq)]
pub enum PracticeError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl PracticeError {
    pub fn not_found(entity: &'static str, id: &str) -> Self {
        PracticeError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<PracticeError> for AppError {
    fn from(err: PracticeError) -> Self {
        match err {
            PracticeError::Validation(msg) => AppError::ValidationError(msg),
            PracticeError::NotFound { .. } => AppError::NotFound(err.to_string()),
            PracticeError::Conflict(msg) => AppError::Conflict(msg),
        }
    }
}
