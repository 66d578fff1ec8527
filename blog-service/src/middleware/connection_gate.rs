use crate::services::{BlogError, ConnectionManager};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use service_core::error::AppError;

/// Lets a request through only when the store is connected.
///
/// When disconnected, one reconnect is attempted (or joined, if another
/// request already started one) before giving up with 503.
pub async fn require_connection(
    State(connection): State<ConnectionManager>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !connection.is_connected() {
        tracing::info!(
            state = %connection.state(),
            path = %req.uri().path(),
            "Database not connected, attempting to connect"
        );
        if !connection.connect().await {
            tracing::error!(path = %req.uri().path(), "Database connection not available");
            return Err(BlogError::Unavailable.into());
        }
    }

    Ok(next.run(req).await)
}
