//! Seams between the connection manager, the accessor and a concrete store.

use crate::models::{Blog, BlogChanges};
use crate::services::BlogError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;

/// An open session against the blog collection.
#[async_trait]
pub trait BlogStore: Send + Sync {
    /// Liveness probe against the target database.
    async fn ping(&self) -> Result<(), BlogError>;

    /// Every post in store-default order.
    async fn find_all(&self) -> Result<Vec<Blog>, BlogError>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Blog>, BlogError>;

    /// Inserts `blog` and returns it with its assigned id.
    async fn insert(&self, blog: Blog) -> Result<Blog, BlogError>;

    /// Merges `changes` into the matching post and returns the post-update
    /// document, or `None` if nothing matched. `updated_at` becomes
    /// `max(now, previous + 1ms)`.
    async fn update(
        &self,
        id: ObjectId,
        changes: &BlogChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Blog>, BlogError>;

    /// Removes the matching post; returns how many were removed (0 or 1).
    async fn delete(&self, id: ObjectId) -> Result<u64, BlogError>;

    /// Releases the session. Further calls on this handle may fail.
    async fn close(&self);
}

/// Opens sessions. Implementations apply their own timeouts and pool bounds.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn BlogStore>, BlogError>;
}
