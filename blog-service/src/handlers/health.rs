use crate::dtos::blog::format_timestamp;
use crate::dtos::HealthResponse;
use crate::AppState;
use axum::{extract::State, Json};
use chrono::Utc;

/// Liveness plus the current store state. Never touches the store itself.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        db_connected: state.connection.is_connected(),
        timestamp: format_timestamp(Utc::now()),
    })
}
