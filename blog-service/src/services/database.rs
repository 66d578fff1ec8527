use crate::config::MongoConfig;
use crate::models::{Blog, BlogChanges};
use crate::services::store::{BlogStore, StoreConnector};
use crate::services::BlogError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, DateTime as BsonDateTime, Document},
    options::{ClientOptions, FindOneAndUpdateOptions, ReturnDocument},
    Client as MongoClient, Collection, Database,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub const BLOGS_COLLECTION: &str = "blogs";

/// Opens MongoDB sessions with the configured timeouts and pool bounds.
#[derive(Debug, Clone)]
pub struct MongoConnector {
    config: MongoConfig,
}

impl MongoConnector {
    pub fn new(config: MongoConfig) -> Self {
        Self { config }
    }

    async fn client_options(&self) -> Result<ClientOptions, BlogError> {
        let mut options = ClientOptions::parse(&self.config.uri).await.map_err(|e| {
            tracing::error!("Failed to parse MongoDB connection string: {}", e);
            BlogError::from(e)
        })?;
        options.app_name = Some("blog-service".to_string());
        options.connect_timeout = Some(self.config.connect_timeout);
        options.server_selection_timeout = Some(self.config.server_selection_timeout);
        options.max_pool_size = Some(self.config.max_pool_size);
        options.min_pool_size = Some(self.config.min_pool_size);
        Ok(options)
    }
}

#[async_trait]
impl StoreConnector for MongoConnector {
    async fn connect(&self) -> Result<Arc<dyn BlogStore>, BlogError> {
        tracing::info!(database = %self.config.database, "Connecting to MongoDB");
        let options = self.client_options().await?;
        let client = MongoClient::with_options(options).map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            BlogError::from(e)
        })?;
        let db = client.database(&self.config.database);
        let store: Arc<dyn BlogStore> = Arc::new(MongoBlogStore {
            client,
            db,
            op_timeout: self.config.socket_timeout,
        });
        Ok(store)
    }
}

/// A MongoDB session scoped to the blog database.
#[derive(Clone)]
pub struct MongoBlogStore {
    client: MongoClient,
    db: Database,
    op_timeout: Duration,
}

impl MongoBlogStore {
    pub fn blogs(&self) -> Collection<Blog> {
        self.db.collection(BLOGS_COLLECTION)
    }

    /// Bounds a single store round-trip; the driver has no socket timeout.
    async fn timed<T, F>(&self, fut: F) -> Result<T, BlogError>
    where
        F: Future<Output = Result<T, mongodb::error::Error>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result.map_err(BlogError::from),
            Err(_) => Err(BlogError::Timeout(self.op_timeout)),
        }
    }
}

#[async_trait]
impl BlogStore for MongoBlogStore {
    async fn ping(&self) -> Result<(), BlogError> {
        self.timed(self.db.run_command(doc! { "ping": 1 }, None))
            .await
            .map_err(|e| {
                tracing::error!("MongoDB ping failed: {}", e);
                e
            })?;
        Ok(())
    }

    async fn find_all(&self) -> Result<Vec<Blog>, BlogError> {
        self.timed(async {
            let cursor = self.blogs().find(None, None).await?;
            let blogs: Vec<Blog> = cursor.try_collect().await?;
            Ok::<_, mongodb::error::Error>(blogs)
        })
        .await
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Blog>, BlogError> {
        self.timed(self.blogs().find_one(doc! { "_id": id }, None))
            .await
    }

    async fn insert(&self, mut blog: Blog) -> Result<Blog, BlogError> {
        let result = self.timed(self.blogs().insert_one(&blog, None)).await?;
        let id = result.inserted_id.as_object_id().ok_or_else(|| {
            BlogError::Internal(anyhow::anyhow!(
                "Store assigned a non-ObjectId identifier: {}",
                result.inserted_id
            ))
        })?;
        blog.id = Some(id);
        Ok(blog)
    }

    async fn update(
        &self,
        id: ObjectId,
        changes: &BlogChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Blog>, BlogError> {
        let pipeline = update_pipeline(changes, now);
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        self.timed(
            self.blogs()
                .find_one_and_update(doc! { "_id": id }, pipeline, options),
        )
        .await
    }

    async fn delete(&self, id: ObjectId) -> Result<u64, BlogError> {
        let result = self
            .timed(self.blogs().delete_one(doc! { "_id": id }, None))
            .await?;
        Ok(result.deleted_count)
    }

    async fn close(&self) {
        tracing::info!("Closing MongoDB client");
        self.client.clone().shutdown().await;
    }
}

/// Builds the `$set` stage for an update.
///
/// An aggregation pipeline is used so `updatedAt` can be computed from the
/// stored value: it becomes `max(now, updatedAt + 1ms)`. Client values are
/// wrapped in `$literal` so strings starting with `$` are not read as field
/// paths.
pub fn update_pipeline(changes: &BlogChanges, now: DateTime<Utc>) -> Vec<Document> {
    let mut set = Document::new();
    if let Some(title) = &changes.title {
        set.insert("title", doc! { "$literal": title });
    }
    if let Some(content) = &changes.content {
        set.insert("content", doc! { "$literal": content });
    }
    if let Some(author) = &changes.author {
        set.insert("author", doc! { "$literal": author });
    }
    if let Some(tags) = &changes.tags {
        set.insert("tags", doc! { "$literal": tags.clone() });
    }
    let now = BsonDateTime::from_chrono(now);
    set.insert(
        "updatedAt",
        doc! { "$max": [now, { "$add": ["$updatedAt", 1_i64] }] },
    );
    vec![doc! { "$set": set }]
}
