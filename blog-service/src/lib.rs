pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use axum::{
    http::{header, HeaderValue, Method, Request},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::BlogConfig;
use crate::services::{BlogError, BlogRepository, ConnectionManager};

#[derive(Clone)]
pub struct AppState {
    pub config: BlogConfig,
    pub connection: ConnectionManager,
}

impl AppState {
    /// Accessor bound to the current store session, or 503 when there is none.
    pub fn blogs(&self) -> Result<BlogRepository, AppError> {
        self.connection
            .get_handle()
            .map(BlogRepository::new)
            .ok_or_else(|| AppError::from(BlogError::Unavailable))
    }
}

pub fn build_router(state: AppState) -> Result<Router, AppError> {
    let origin = state
        .config
        .cors
        .allowed_origin
        .parse::<HeaderValue>()
        .map_err(|e| {
            tracing::error!(
                "Invalid CORS origin '{}': {}",
                state.config.cors.allowed_origin,
                e
            );
            AppError::ConfigError(anyhow::anyhow!(
                "Invalid FRONTEND_URL '{}': {}",
                state.config.cors.allowed_origin,
                e
            ))
        })?;

    // Only the blog routes need a live store; health must answer regardless.
    // Unsupported methods on a known path get the same ungated 404 as unknown
    // paths, so the gate goes on each method router ahead of its fallback.
    let gate = from_fn_with_state(state.connection.clone(), middleware::require_connection);
    let blog_routes = Router::new()
        .route(
            "/blogs",
            get(handlers::list_blogs)
                .post(handlers::create_blog)
                .route_layer(gate.clone())
                .fallback(handlers::not_found),
        )
        .route(
            "/blogs/:id",
            get(handlers::get_blog)
                .put(handlers::update_blog)
                .delete(handlers::delete_blog)
                .route_layer(gate)
                .fallback(handlers::not_found),
        );

    let api = blog_routes.route(
        "/health",
        get(handlers::health_check).fallback(handlers::not_found),
    );

    let app = Router::new()
        .nest("/api", api)
        .route(
            "/metrics",
            get(handlers::metrics::metrics).fallback(handlers::not_found),
        )
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE]),
        );

    Ok(app)
}
