use axum::{http::header, response::IntoResponse};

pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        crate::services::get_metrics(),
    )
}
