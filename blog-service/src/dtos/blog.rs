use crate::models::{Blog, BlogChanges, NewBlog};
use crate::services::BlogError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const MISSING_FIELDS: &str = "Blog title and content are required";
pub const EMPTY_FIELDS: &str = "Blog title and content cannot be empty";

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateBlogRequest {
    #[validate(
        required(message = "title is required"),
        length(min = 1, message = "title must not be empty")
    )]
    pub title: Option<String>,
    #[validate(
        required(message = "content is required"),
        length(min = 1, message = "content must not be empty")
    )]
    pub content: Option<String>,
    pub author: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl CreateBlogRequest {
    pub fn into_new_blog(self) -> Result<NewBlog, BlogError> {
        self.validate()
            .map_err(|e| BlogError::Validation(MISSING_FIELDS.to_string(), Some(e)))?;

        match (self.title, self.content) {
            (Some(title), Some(content)) => Ok(NewBlog {
                title,
                content,
                author: self.author,
                tags: self.tags.unwrap_or_default(),
            }),
            _ => Err(BlogError::Validation(MISSING_FIELDS.to_string(), None)),
        }
    }
}

/// Partial update. Absent (or `null`) fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateBlogRequest {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: Option<String>,
    pub author: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl UpdateBlogRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.author.is_none() && self.tags.is_none()
    }

    pub fn into_changes(self) -> Result<BlogChanges, BlogError> {
        self.validate()
            .map_err(|e| BlogError::Validation(EMPTY_FIELDS.to_string(), Some(e)))?;

        Ok(BlogChanges {
            title: self.title,
            content: self.content,
            author: self.author,
            tags: self.tags,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlogResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Blog> for BlogResponse {
    fn from(blog: Blog) -> Self {
        Self {
            id: blog.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: blog.title,
            content: blog.content,
            author: blog.author,
            tags: blog.tags,
            created_at: format_timestamp(blog.created_at),
            updated_at: format_timestamp(blog.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub db_connected: bool,
    pub timestamp: String,
}

/// RFC 3339 with millisecond precision and a `Z` suffix.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
