use axum::http::Uri;
use service_core::error::AppError;

pub async fn not_found(uri: Uri) -> AppError {
    tracing::debug!(path = %uri.path(), "No route matched");
    AppError::NotFound(anyhow::anyhow!("Endpoint not found"))
}
