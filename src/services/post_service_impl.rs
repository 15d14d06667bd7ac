//! `SeaORM` implementation of the `PostService` trait.

use async_trait::async_trait;
use tracing::warn;

use crate::db::{NewPost, PostChanges, PostFilter, Store};
use crate::models::post::Post;
use crate::services::post_service::{PostDraft, PostError, PostPage, PostQuery, PostService};
use crate::services::slug::{derive_excerpt, slugify};

pub struct SeaOrmPostService {
    store: Store,
}

impl SeaOrmPostService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PostService for SeaOrmPostService {
    async fn list(&self, query: PostQuery) -> Result<PostPage, PostError> {
        let page = query.page.max(1);
        let limit = query.limit.max(1);

        let filter = PostFilter {
            status: query.status,
            category: query.category,
            search: query.search,
            limit,
            offset: (page - 1) * limit,
        };

        let posts = self.store.list_posts(&filter).await?;
        let total_count = self.store.count_posts(&filter).await?;

        Ok(PostPage {
            posts,
            page,
            limit,
            total_count,
            total_pages: total_count.div_ceil(limit),
        })
    }

    async fn get(&self, id: i32) -> Result<Post, PostError> {
        self.store
            .get_post(id)
            .await?
            .ok_or_else(|| PostError::NotFound(id.to_string()))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Post, PostError> {
        self.store
            .get_post_by_slug(slug)
            .await?
            .ok_or_else(|| PostError::NotFound(slug.to_string()))
    }

    async fn record_view(&self, id: i32) {
        if let Err(e) = self.store.increment_post_views(id).await {
            warn!("Failed to increment view count for post {id}: {e}");
        }
    }

    async fn create(&self, author_id: i32, draft: PostDraft) -> Result<Post, PostError> {
        let slug = slugify(&draft.title);
        if self.store.post_slug_taken(&slug, None).await? {
            return Err(PostError::DuplicateSlug(slug));
        }

        let excerpt = draft
            .excerpt
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| derive_excerpt(&draft.content));

        let post = self
            .store
            .create_post(NewPost {
                title: draft.title,
                slug,
                content: draft.content,
                excerpt,
                featured_image: draft.featured_image,
                category: draft.category,
                tags: draft.tags.unwrap_or_default(),
                status: draft.status.unwrap_or_default(),
                author_id,
            })
            .await?;

        Ok(post)
    }

    async fn update(&self, id: i32, draft: PostDraft) -> Result<Post, PostError> {
        let existing = self
            .store
            .get_post(id)
            .await?
            .ok_or_else(|| PostError::NotFound(id.to_string()))?;

        let slug = if draft.title == existing.title {
            None
        } else {
            let slug = slugify(&draft.title);
            if self.store.post_slug_taken(&slug, Some(id)).await? {
                return Err(PostError::DuplicateSlug(slug));
            }
            Some(slug)
        };

        let excerpt = draft
            .excerpt
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| derive_excerpt(&draft.content));

        let post = self
            .store
            .update_post(
                id,
                PostChanges {
                    title: draft.title,
                    slug,
                    content: draft.content,
                    excerpt,
                    featured_image: draft.featured_image,
                    category: draft.category,
                    tags: draft.tags,
                    status: draft.status,
                },
            )
            .await?
            .ok_or_else(|| PostError::NotFound(id.to_string()))?;

        Ok(post)
    }

    async fn delete(&self, id: i32) -> Result<(), PostError> {
        let deleted = self.store.delete_post(id).await?;
        if !deleted {
            return Err(PostError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn categories(&self) -> Result<Vec<String>, PostError> {
        Ok(self.store.post_categories().await?)
    }

    async fn popular(&self, limit: u64) -> Result<Vec<Post>, PostError> {
        Ok(self.store.popular_posts(limit).await?)
    }
}
