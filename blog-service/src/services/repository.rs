use crate::models::blog::store_now;
use crate::models::{Blog, BlogChanges, NewBlog};
use crate::services::metrics::record_blog_operation;
use crate::services::store::BlogStore;
use crate::services::BlogError;
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;

/// Blog operations over one store session.
///
/// Identifiers are validated here, before the store is touched, so a
/// malformed id is reported as [`BlogError::InvalidIdentifier`] rather than
/// as a missing post.
#[derive(Clone)]
pub struct BlogRepository {
    store: Arc<dyn BlogStore>,
}

impl BlogRepository {
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self { store }
    }

    pub async fn find_all(&self) -> Result<Vec<Blog>, BlogError> {
        let result = self.store.find_all().await;
        record_blog_operation("find_all", result.is_ok());
        result.map_err(|e| {
            tracing::error!(operation = "find_all", error = %e, "Error finding all blogs");
            e
        })
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Blog>, BlogError> {
        let oid = parse_id("find_by_id", id)?;
        let result = self.store.find_by_id(oid).await;
        record_blog_operation("find_by_id", result.is_ok());
        result.map_err(|e| {
            tracing::error!(operation = "find_by_id", blog_id = %id, error = %e, "Error finding blog");
            e
        })
    }

    /// Stamps both timestamps with the current time and inserts.
    pub async fn create(&self, new_blog: NewBlog) -> Result<Blog, BlogError> {
        let blog = Blog::new(new_blog, store_now());
        let result = self.store.insert(blog).await;
        record_blog_operation("create", result.is_ok());
        result.map_err(|e| {
            tracing::error!(operation = "create", error = %e, "Error creating blog");
            e
        })
    }

    /// Merges `changes` into the post and refreshes `updated_at`.
    pub async fn update(&self, id: &str, changes: &BlogChanges) -> Result<Option<Blog>, BlogError> {
        let oid = parse_id("update", id)?;
        let result = self.store.update(oid, changes, store_now()).await;
        record_blog_operation("update", result.is_ok());
        result.map_err(|e| {
            tracing::error!(operation = "update", blog_id = %id, error = %e, "Error updating blog");
            e
        })
    }

    /// Returns the number of removed posts (0 or 1).
    pub async fn delete(&self, id: &str) -> Result<u64, BlogError> {
        let oid = parse_id("delete", id)?;
        let result = self.store.delete(oid).await;
        record_blog_operation("delete", result.is_ok());
        result.map_err(|e| {
            tracing::error!(operation = "delete", blog_id = %id, error = %e, "Error deleting blog");
            e
        })
    }
}

fn parse_id(operation: &'static str, id: &str) -> Result<ObjectId, BlogError> {
    ObjectId::parse_str(id).map_err(|_| {
        tracing::warn!(operation, blog_id = %id, "Invalid blog ID format");
        BlogError::InvalidIdentifier(id.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::MemoryBlogStore;

    fn repository() -> (BlogRepository, Arc<MemoryBlogStore>) {
        let store = Arc::new(MemoryBlogStore::new());
        (BlogRepository::new(store.clone()), store)
    }

    fn new_blog() -> NewBlog {
        NewBlog {
            title: "A".to_string(),
            content: "B".to_string(),
            author: Some("Ada".to_string()),
            tags: vec!["intro".to_string()],
        }
    }

    #[tokio::test]
    async fn create_stamps_equal_timestamps() {
        let (repo, _) = repository();
        let started = store_now();

        let blog = repo.create(new_blog()).await.unwrap();

        assert!(blog.id.is_some());
        assert_eq!(blog.created_at, blog.updated_at);
        assert!(blog.created_at >= started);
    }

    #[tokio::test]
    async fn malformed_ids_never_reach_the_store() {
        let (repo, store) = repository();

        for id in ["", "123", "not-an-object-id", "zzzzzzzzzzzzzzzzzzzzzzzz"] {
            assert!(matches!(
                repo.find_by_id(id).await,
                Err(BlogError::InvalidIdentifier(_))
            ));
            assert!(matches!(
                repo.update(id, &BlogChanges::default()).await,
                Err(BlogError::InvalidIdentifier(_))
            ));
            assert!(matches!(
                repo.delete(id).await,
                Err(BlogError::InvalidIdentifier(_))
            ));
        }
        assert_eq!(store.operations(), 0);
    }

    #[tokio::test]
    async fn unknown_ids_are_absent() {
        let (repo, _) = repository();
        let id = ObjectId::new().to_hex();

        assert!(repo.find_by_id(&id).await.unwrap().is_none());
        assert!(repo
            .update(&id, &BlogChanges::default())
            .await
            .unwrap()
            .is_none());
        assert_eq!(repo.delete(&id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_merges_and_advances_updated_at() {
        let (repo, _) = repository();
        let created = repo.create(new_blog()).await.unwrap();
        let id = created.id.unwrap().to_hex();

        let changes = BlogChanges {
            content: Some("C".to_string()),
            ..Default::default()
        };
        let first = repo.update(&id, &changes).await.unwrap().unwrap();
        let second = repo.update(&id, &changes).await.unwrap().unwrap();

        assert_eq!(first.title, "A");
        assert_eq!(first.content, "C");
        assert_eq!(first.author.as_deref(), Some("Ada"));
        assert_eq!(first.tags, vec!["intro".to_string()]);
        assert_eq!(first.created_at, created.created_at);
        assert!(first.updated_at > created.updated_at);
        assert!(second.updated_at > first.updated_at);
    }

    #[tokio::test]
    async fn store_failures_surface_as_errors() {
        let (repo, store) = repository();
        store.set_reachable(false);

        assert!(matches!(repo.find_all().await, Err(BlogError::Internal(_))));
    }
}
