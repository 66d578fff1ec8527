//! In-process store used by tests and local development without MongoDB.

use crate::models::{Blog, BlogChanges};
use crate::services::store::{BlogStore, StoreConnector};
use crate::services::BlogError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Blog posts kept in insertion order.
pub struct MemoryBlogStore {
    blogs: Mutex<Vec<Blog>>,
    reachable: AtomicBool,
    operations: AtomicUsize,
    closes: AtomicUsize,
}

impl Default for MemoryBlogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBlogStore {
    pub fn new() -> Self {
        Self {
            blogs: Mutex::new(Vec::new()),
            reachable: AtomicBool::new(true),
            operations: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
        }
    }

    /// Number of data operations (not pings) that reached the store.
    pub fn operations(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.blogs.lock().map(|blogs| blogs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Makes pings and data operations on open sessions fail (`false`).
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), BlogError> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BlogError::Internal(anyhow::anyhow!(
                "connection refused: in-memory store is unreachable"
            )))
        }
    }

    fn touch(&self) -> Result<std::sync::MutexGuard<'_, Vec<Blog>>, BlogError> {
        self.check()?;
        self.operations.fetch_add(1, Ordering::SeqCst);
        self.blogs
            .lock()
            .map_err(|e| BlogError::Internal(anyhow::anyhow!("Memory store mutex poisoned: {}", e)))
    }
}

#[async_trait]
impl BlogStore for MemoryBlogStore {
    async fn ping(&self) -> Result<(), BlogError> {
        self.check()
    }

    async fn find_all(&self) -> Result<Vec<Blog>, BlogError> {
        Ok(self.touch()?.clone())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<Blog>, BlogError> {
        Ok(self
            .touch()?
            .iter()
            .find(|blog| blog.id == Some(id))
            .cloned())
    }

    async fn insert(&self, mut blog: Blog) -> Result<Blog, BlogError> {
        let mut blogs = self.touch()?;
        blog.id = Some(ObjectId::new());
        blogs.push(blog.clone());
        Ok(blog)
    }

    async fn update(
        &self,
        id: ObjectId,
        changes: &BlogChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Blog>, BlogError> {
        let mut blogs = self.touch()?;
        Ok(blogs
            .iter_mut()
            .find(|blog| blog.id == Some(id))
            .map(|blog| {
                blog.apply(changes, now);
                blog.clone()
            }))
    }

    async fn delete(&self, id: ObjectId) -> Result<u64, BlogError> {
        let mut blogs = self.touch()?;
        let before = blogs.len();
        blogs.retain(|blog| blog.id != Some(id));
        Ok((before - blogs.len()) as u64)
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Hands out sessions onto one shared [`MemoryBlogStore`], so data survives
/// reconnects. Availability can be toggled to simulate an outage.
pub struct MemoryConnector {
    store: Arc<MemoryBlogStore>,
    available: AtomicBool,
    attempts: AtomicUsize,
    latency: Duration,
}

impl MemoryConnector {
    pub fn new(store: Arc<MemoryBlogStore>) -> Self {
        Self {
            store,
            available: AtomicBool::new(true),
            attempts: AtomicUsize::new(0),
            latency: Duration::ZERO,
        }
    }

    /// Makes every `connect` take `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn store(&self) -> Arc<MemoryBlogStore> {
        self.store.clone()
    }

    /// Simulates the database going away (`false`) or coming back (`true`).
    /// Sessions that are already open fail their operations while unavailable.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
        self.store.set_reachable(available);
    }

    /// Number of times `connect` was called.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreConnector for MemoryConnector {
    async fn connect(&self) -> Result<Arc<dyn BlogStore>, BlogError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if !self.available.load(Ordering::SeqCst) {
            return Err(BlogError::Internal(anyhow::anyhow!(
                "connection refused: in-memory store is unavailable"
            )));
        }
        let store: Arc<dyn BlogStore> = self.store.clone();
        Ok(store)
    }
}
