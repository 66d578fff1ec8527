use service_core::error::AppError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlogError {
    #[error("Invalid blog ID format: {0}")]
    InvalidIdentifier(String),

    #[error("{0}")]
    Validation(String, #[source] Option<validator::ValidationErrors>),

    #[error("Database connection not available")]
    Unavailable,

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl BlogError {
    /// Converts into the HTTP error, using `action` as the message for
    /// failures the client cannot fix (e.g. "Failed to fetch blogs").
    pub fn into_app_error(self, action: &'static str) -> AppError {
        match self {
            BlogError::InvalidIdentifier(_) => {
                AppError::BadRequest(anyhow::anyhow!("Invalid blog ID format"))
            }
            BlogError::Validation(message, Some(errors)) => {
                AppError::BadRequest(anyhow::Error::new(errors).context(message))
            }
            BlogError::Validation(message, None) => AppError::BadRequest(anyhow::anyhow!(message)),
            BlogError::Unavailable => {
                AppError::ServiceUnavailable("Database connection not available".to_string())
            }
            other => AppError::InternalError(anyhow::Error::new(other).context(action)),
        }
    }
}

impl From<BlogError> for AppError {
    fn from(err: BlogError) -> Self {
        err.into_app_error("Internal server error")
    }
}
