use crate::config::BlogConfig;
use crate::services::{ConnectionManager, MongoConnector, StoreConnector};
use crate::{build_router, AppState};
use axum::Router;
use service_core::error::AppError;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    connection: ConnectionManager,
}

impl Application {
    pub async fn build(config: BlogConfig) -> Result<Self, AppError> {
        let connector: Arc<dyn StoreConnector> =
            Arc::new(MongoConnector::new(config.mongodb.clone()));
        Self::build_with_connector(config, connector).await
    }

    /// Connects to the store, then binds the listener.
    ///
    /// Fails if the initial connection cannot be established; no background
    /// retry is left running in that case.
    pub async fn build_with_connector(
        config: BlogConfig,
        connector: Arc<dyn StoreConnector>,
    ) -> Result<Self, AppError> {
        let connection = ConnectionManager::new(connector, config.mongodb.retry_delay);

        if !connection.connect().await {
            tracing::error!("Failed to connect to MongoDB on startup");
            connection.shutdown().await;
            return Err(AppError::ServiceUnavailable(
                "Failed to connect to MongoDB on startup".to_string(),
            ));
        }

        match Self::bind(config, connection.clone()).await {
            Ok(app) => Ok(app),
            Err(e) => {
                connection.shutdown().await;
                Err(e)
            }
        }
    }

    async fn bind(config: BlogConfig, connection: ConnectionManager) -> Result<Self, AppError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let state = AppState {
            config,
            connection: connection.clone(),
        };
        let router = build_router(state)?;

        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        Ok(Self {
            port,
            listener,
            router,
            connection,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Serves until `signal` resolves, drains in-flight requests, then shuts
    /// the store connection down.
    pub async fn run_until<F>(self, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let result = axum::serve(self.listener, self.router)
            .with_graceful_shutdown(signal)
            .await;

        if let Err(e) = &result {
            tracing::error!("Server error: {}", e);
        }
        self.connection.shutdown().await;
        tracing::info!("Server stopped");
        result
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_until(shutdown_signal()).await
    }
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
