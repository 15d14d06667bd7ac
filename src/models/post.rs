use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::entities::posts;

/// Publication state of a post. Stored as lowercase text in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }

    /// Parse a status from its stored text form. Returns `None` for anything
    /// outside the known set.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(Self::Draft),
            "published" => Some(Self::Published),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

impl Default for PostStatus {
    fn default() -> Self {
        Self::Draft
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A blog post as the rest of the application sees it. Tags are expanded
/// from their comma-separated column form into a list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i32,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub view_count: i32,
    pub author_id: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<posts::Model> for Post {
    type Error = anyhow::Error;

    fn try_from(model: posts::Model) -> Result<Self, Self::Error> {
        let status = PostStatus::parse(&model.status)
            .with_context(|| format!("Unknown post status in database: {}", model.status))?;

        Ok(Self {
            id: model.id,
            title: model.title,
            slug: model.slug,
            content: model.content,
            excerpt: model.excerpt,
            featured_image: model.featured_image,
            category: model.category,
            tags: split_tags(model.tags.as_deref()),
            status,
            view_count: model.view_count,
            author_id: model.author_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// Split a stored tag column into individual tags, dropping empty entries.
#[must_use]
pub fn split_tags(raw: Option<&str>) -> Vec<String> {
    raw.map_or_else(Vec::new, |value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(ToString::to_string)
            .collect()
    })
}

/// Join tags back into their column form. An empty list stores as NULL.
#[must_use]
pub fn join_tags(tags: &[String]) -> Option<String> {
    if tags.is_empty() {
        None
    } else {
        Some(tags.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [PostStatus::Draft, PostStatus::Published, PostStatus::Archived] {
            assert_eq!(PostStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PostStatus::parse("deleted"), None);
        assert_eq!(PostStatus::parse("Published"), None);
    }

    #[test]
    fn test_split_tags_trims_and_drops_empties() {
        assert_eq!(
            split_tags(Some("rust, web,  sqlite ,")),
            vec!["rust", "web", "sqlite"]
        );
        assert!(split_tags(Some("")).is_empty());
        assert!(split_tags(None).is_empty());
    }

    #[test]
    fn test_join_tags_uses_comma_space() {
        let tags = vec!["rust".to_string(), "web".to_string()];
        assert_eq!(join_tags(&tags), Some("rust, web".to_string()));
        assert_eq!(join_tags(&[]), None);
    }

    #[test]
    fn test_model_conversion_rejects_unknown_status() {
        let model = posts::Model {
            id: 1,
            title: "Hello".to_string(),
            slug: "hello".to_string(),
            content: "Body".to_string(),
            excerpt: None,
            featured_image: None,
            category: None,
            tags: Some("a, b".to_string()),
            status: "bogus".to_string(),
            view_count: 0,
            author_id: 1,
            created_at: "2025-03-10T00:00:00+00:00".to_string(),
            updated_at: "2025-03-10T00:00:00+00:00".to_string(),
        };

        assert!(Post::try_from(model).is_err());
    }
}
