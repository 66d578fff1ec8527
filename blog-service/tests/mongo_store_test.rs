//! Runs against a live MongoDB. Start one and run with
//! `MONGODB_URI=mongodb://localhost:27017 cargo test -- --ignored`.

use blog_service::config::MongoConfig;
use blog_service::models::blog::store_now;
use blog_service::models::{Blog, BlogChanges, NewBlog};
use blog_service::services::{
    BlogRepository, ConnectionManager, MongoConnector, StoreConnector,
};
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;
use std::time::Duration;

fn test_mongo_config() -> MongoConfig {
    dotenvy::dotenv().ok();
    MongoConfig {
        uri: std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
        database: format!("blog_test_{}", ObjectId::new().to_hex()),
        connect_timeout: Duration::from_secs(5),
        server_selection_timeout: Duration::from_secs(5),
        ..MongoConfig::default()
    }
}

async fn teardown_test_db(config: &MongoConfig) {
    let client = mongodb::Client::with_uri_str(&config.uri).await.unwrap();
    client.database(&config.database).drop(None).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn crud_round_trip_against_mongodb() {
    let config = test_mongo_config();
    let store = MongoConnector::new(config.clone())
        .connect()
        .await
        .expect("Failed to connect to MongoDB");
    store.ping().await.expect("Ping failed");
    let repo = BlogRepository::new(store.clone());

    let started = store_now();
    let created = repo
        .create(NewBlog {
            title: "A".to_string(),
            content: "B".to_string(),
            author: None,
            tags: vec!["mongo".to_string()],
        })
        .await
        .unwrap();
    assert!(created.created_at >= started);
    let id = created.id.unwrap().to_hex();

    let fetched = repo.find_by_id(&id).await.unwrap().unwrap();
    assert_eq!(fetched, created);

    let changes = BlogChanges {
        title: Some("$title".to_string()),
        ..Default::default()
    };
    let first = repo.update(&id, &changes).await.unwrap().unwrap();
    let second = repo.update(&id, &changes).await.unwrap().unwrap();
    assert_eq!(first.title, "$title");
    assert_eq!(first.content, "B");
    assert!(first.updated_at > created.updated_at);
    assert!(second.updated_at > first.updated_at);

    let all: Vec<Blog> = repo.find_all().await.unwrap();
    assert_eq!(all.len(), 1);

    assert_eq!(repo.delete(&id).await.unwrap(), 1);
    assert_eq!(repo.delete(&id).await.unwrap(), 0);

    store.close().await;
    teardown_test_db(&config).await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn manager_connects_to_mongodb() {
    let config = test_mongo_config();
    let connector: Arc<dyn StoreConnector> = Arc::new(MongoConnector::new(config.clone()));
    let manager = ConnectionManager::new(connector, config.retry_delay);

    assert!(manager.connect().await);
    assert!(manager.get_handle().is_some());

    manager.shutdown().await;
    assert!(!manager.is_connected());
    teardown_test_db(&config).await;
}

#[tokio::test]
#[ignore = "requires network access to an unroutable address"]
async fn unreachable_server_fails_to_connect() {
    let config = MongoConfig {
        uri: "mongodb://10.255.255.1:27017".to_string(),
        connect_timeout: Duration::from_millis(200),
        server_selection_timeout: Duration::from_millis(500),
        ..MongoConfig::default()
    };
    let connector: Arc<dyn StoreConnector> = Arc::new(MongoConnector::new(config));
    let manager = ConnectionManager::new(connector, Duration::from_secs(3600));

    assert!(!manager.connect().await);
    manager.shutdown().await;
}
