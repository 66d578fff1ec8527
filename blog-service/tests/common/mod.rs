#![allow(dead_code)]

use blog_service::config::{BlogConfig, CorsConfig, MongoConfig, ObservabilityConfig};
use blog_service::services::{ConnectionManager, MemoryBlogStore, MemoryConnector, StoreConnector};
use blog_service::startup::Application;
use blog_service::{build_router, AppState};
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const FRONTEND_ORIGIN: &str = "http://localhost:5173";

/// Configuration for tests: random port, quiet logs and a retry delay long
/// enough that background reconnects never interfere.
pub fn test_config() -> BlogConfig {
    BlogConfig {
        common: CoreConfig {
            port: 0,
            log_level: "error".to_string(),
        },
        mongodb: MongoConfig {
            retry_delay: Duration::from_secs(3600),
            ..MongoConfig::default()
        },
        cors: CorsConfig {
            allowed_origin: FRONTEND_ORIGIN.to_string(),
        },
        observability: ObservabilityConfig {
            service_name: "blog-service-test".to_string(),
            otlp_endpoint: None,
        },
    }
}

pub fn memory_connector() -> Arc<MemoryConnector> {
    Arc::new(MemoryConnector::new(Arc::new(MemoryBlogStore::new())))
}

/// Router over `connector` without a running server, for `oneshot` tests.
/// The manager starts disconnected.
pub fn router_with(connector: Arc<MemoryConnector>) -> (axum::Router, ConnectionManager) {
    let config = test_config();
    let store_connector: Arc<dyn StoreConnector> = connector;
    let connection = ConnectionManager::new(store_connector, config.mongodb.retry_delay);
    let state = AppState {
        config,
        connection: connection.clone(),
    };
    let router = build_router(state).expect("Failed to build router");
    (router, connection)
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
    pub connector: Arc<MemoryConnector>,
    pub store: Arc<MemoryBlogStore>,
    pub connection: ConnectionManager,
    shutdown: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<std::io::Result<()>>>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let connector = memory_connector();
        let store = connector.store();
        let store_connector: Arc<dyn StoreConnector> = connector.clone();

        let app = Application::build_with_connector(test_config(), store_connector)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let connection = app.connection().clone();
        let address = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            app.run_until(async {
                shutdown_rx.await.ok();
            })
            .await
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/api/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        TestApp {
            address,
            port,
            client,
            connector,
            store,
            connection,
            shutdown: Some(shutdown_tx),
            server: Some(server),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn create_blog(&self, body: serde_json::Value) -> serde_json::Value {
        let response = self
            .client
            .post(self.url("/api/blogs"))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.expect("Invalid JSON response")
    }

    /// Triggers graceful shutdown and waits for the server task to finish.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            tx.send(()).ok();
        }
        if let Some(server) = self.server.take() {
            server
                .await
                .expect("Server task panicked")
                .expect("Server returned an error");
        }
    }
}
