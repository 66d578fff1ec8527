use chrono::{DateTime, Duration, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A blog post as stored in the `blogs` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating a post.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBlog {
    pub title: String,
    pub content: String,
    pub author: Option<String>,
    pub tags: Vec<String>,
}

/// Fields merged into an existing post; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlogChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl Blog {
    /// Builds an unsaved post whose timestamps are both `now`.
    pub fn new(new_blog: NewBlog, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            title: new_blog.title,
            content: new_blog.content,
            author: new_blog.author,
            tags: new_blog.tags,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges `changes` and moves `updated_at` forward.
    pub fn apply(&mut self, changes: &BlogChanges, now: DateTime<Utc>) {
        if let Some(title) = &changes.title {
            self.title = title.clone();
        }
        if let Some(content) = &changes.content {
            self.content = content.clone();
        }
        if let Some(author) = &changes.author {
            self.author = Some(author.clone());
        }
        if let Some(tags) = &changes.tags {
            self.tags = tags.clone();
        }
        self.updated_at = next_updated_at(self.updated_at, now);
    }
}

impl BlogChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.author.is_none() && self.tags.is_none()
    }
}

/// The smallest timestamp at or after `now` that is strictly later than
/// `previous`, at the store's millisecond resolution.
pub fn next_updated_at(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let floor = previous + Duration::milliseconds(1);
    if now > floor {
        now
    } else {
        floor
    }
}

/// Current time truncated to the millisecond resolution of BSON datetimes,
/// so a value returned to a client equals the value later read back.
pub fn store_now() -> DateTime<Utc> {
    mongodb::bson::DateTime::now().to_chrono()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(now: DateTime<Utc>) -> Blog {
        Blog::new(
            NewBlog {
                title: "A".to_string(),
                content: "B".to_string(),
                author: None,
                tags: Vec::new(),
            },
            now,
        )
    }

    #[test]
    fn new_blog_has_equal_timestamps() {
        let now = store_now();
        let blog = sample(now);

        assert_eq!(blog.created_at, blog.updated_at);
        assert_eq!(blog.created_at, now);
        assert!(blog.tags.is_empty());
    }

    #[test]
    fn apply_merges_only_given_fields() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut blog = sample(created);

        blog.apply(
            &BlogChanges {
                content: Some("C".to_string()),
                ..Default::default()
            },
            created + Duration::seconds(10),
        );

        assert_eq!(blog.title, "A");
        assert_eq!(blog.content, "C");
        assert_eq!(blog.created_at, created);
        assert_eq!(blog.updated_at, created + Duration::seconds(10));
    }

    #[test]
    fn updated_at_moves_forward_even_when_clock_does_not() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut blog = sample(created);

        blog.apply(&BlogChanges::default(), created);
        assert_eq!(blog.updated_at, created + Duration::milliseconds(1));

        blog.apply(&BlogChanges::default(), created - Duration::seconds(5));
        assert_eq!(blog.updated_at, created + Duration::milliseconds(2));
    }

    #[test]
    fn store_now_has_millisecond_precision() {
        let now = store_now();
        assert_eq!(now.timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn bson_document_uses_camel_case_fields() {
        let blog = sample(store_now());
        let doc = mongodb::bson::to_document(&blog).unwrap();

        assert!(doc.contains_key("createdAt"));
        assert!(doc.contains_key("updatedAt"));
        assert!(!doc.contains_key("_id"));
        assert!(!doc.contains_key("author"));
    }
}
