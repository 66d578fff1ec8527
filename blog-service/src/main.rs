use blog_service::{config::BlogConfig, services::init_metrics, startup::Application};
use service_core::error::AppError;
use service_core::observability::{init_tracing, shutdown_tracing};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = BlogConfig::load()?;

    init_tracing(
        &config.observability.service_name,
        &config.common.log_level,
        config.observability.otlp_endpoint.as_deref(),
    );

    // Must run before any metric is recorded
    init_metrics()?;

    tracing::info!(
        service = %config.observability.service_name,
        version = env!("CARGO_PKG_VERSION"),
        database = %config.mongodb.database,
        "Starting blog service"
    );

    let app = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to start server: {}", e);
        shutdown_tracing();
        e
    })?;

    app.run_until_stopped().await?;

    shutdown_tracing();
    Ok(())
}
