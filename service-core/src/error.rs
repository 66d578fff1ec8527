use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

/// Splits an error chain into the outermost message and the remaining causes.
///
/// `anyhow!("Failed to fetch blogs")` yields no details, while an error with
/// context attached yields the context as the message and the underlying
/// causes joined by `": "` as details.
fn message_and_details(err: &anyhow::Error) -> (String, Option<String>) {
    let mut chain = err.chain();
    let message = chain
        .next()
        .map(|cause| cause.to_string())
        .unwrap_or_default();
    let rest: Vec<String> = chain.map(|cause| cause.to_string()).collect();
    let details = if rest.is_empty() {
        None
    } else {
        Some(rest.join(": "))
    };
    (message, details)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<String>,
        }

        let (status, error_message, details) = match self {
            AppError::BadRequest(err) => {
                let (message, details) = message_and_details(&err);
                (StatusCode::BAD_REQUEST, message, details)
            }
            AppError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string(), None),
            AppError::InternalError(err) => {
                let (message, details) = message_and_details(&err);
                (StatusCode::INTERNAL_SERVER_ERROR, message, details)
            }
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg, None),
            AppError::ConfigError(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error".to_string(),
                Some(err.to_string()),
            ),
        };

        (
            status,
            Json(ErrorResponse {
                error: error_message,
                details,
            }),
        )
            .into_response()
    }
}
