//! Domain service for post management.
//!
//! Wraps the store with the publishing rules: slug and excerpt derivation,
//! status filtering, and pagination.

use thiserror::Error;

use crate::models::post::{Post, PostStatus};

/// Domain errors for post operations.
#[derive(Debug, Error)]
pub enum PostError {
    #[error("Post not found: {0}")]
    NotFound(String),

    #[error("Duplicate slug: {0}")]
    DuplicateSlug(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for PostError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for PostError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Incoming post fields from a create or update request. Optional fields
/// left as `None` fall back to defaults on create and stay untouched on
/// update.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<PostStatus>,
}

/// Listing parameters. Every listing is scoped to a single status.
#[derive(Debug, Clone)]
pub struct PostQuery {
    pub page: u64,
    pub limit: u64,
    pub status: PostStatus,
    pub category: Option<String>,
    pub search: Option<String>,
}

/// One page of posts plus the pagination bookkeeping for the response.
#[derive(Debug, Clone)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub page: u64,
    pub limit: u64,
    pub total_count: u64,
    pub total_pages: u64,
}

/// Domain service trait for posts.
#[async_trait::async_trait]
pub trait PostService: Send + Sync {
    /// Lists posts matching the query, newest first.
    async fn list(&self, query: PostQuery) -> Result<PostPage, PostError>;

    /// Fetches a single post by ID.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::NotFound`] if no such post exists.
    async fn get(&self, id: i32) -> Result<Post, PostError>;

    /// Fetches a single post by slug.
    async fn get_by_slug(&self, slug: &str) -> Result<Post, PostError>;

    /// Bumps a post's view counter. Failures are logged and swallowed so a
    /// broken counter never takes down a read.
    async fn record_view(&self, id: i32);

    /// Creates a post authored by the given user. The slug is derived from
    /// the title and the excerpt from the content when not supplied.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::DuplicateSlug`] when another post already uses
    /// the derived slug.
    async fn create(&self, author_id: i32, draft: PostDraft) -> Result<Post, PostError>;

    /// Updates a post. The slug is regenerated only when the title changed.
    async fn update(&self, id: i32, draft: PostDraft) -> Result<Post, PostError>;

    /// Deletes a post.
    ///
    /// # Errors
    ///
    /// Returns [`PostError::NotFound`] if no such post exists.
    async fn delete(&self, id: i32) -> Result<(), PostError>;

    /// Distinct categories in use.
    async fn categories(&self) -> Result<Vec<String>, PostError>;

    /// Most viewed published posts.
    async fn popular(&self, limit: u64) -> Result<Vec<Post>, PostError>;
}
