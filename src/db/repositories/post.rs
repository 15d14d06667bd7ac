use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set,
};

use crate::entities::posts;
use crate::models::post::{Post, PostStatus, join_tags};

/// Filters applied when listing or counting posts. Every listing is scoped
/// to exactly one status.
#[derive(Debug, Clone)]
pub struct PostFilter {
    pub status: PostStatus,
    pub category: Option<String>,
    pub search: Option<String>,
    pub limit: u64,
    pub offset: u64,
}

/// Fields required to insert a new post row.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub featured_image: Option<String>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub author_id: i32,
}

/// Fields to write on an existing post. Title, content and excerpt are
/// always rewritten; the rest only when present. The slug is only set when
/// the title changed.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub title: String,
    pub slug: Option<String>,
    pub content: String,
    pub excerpt: String,
    pub featured_image: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<PostStatus>,
}

pub struct PostRepository {
    conn: DatabaseConnection,
}

impl PostRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a new post
    pub async fn create(&self, new_post: NewPost) -> Result<Post> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = posts::ActiveModel {
            title: Set(new_post.title),
            slug: Set(new_post.slug),
            content: Set(new_post.content),
            excerpt: Set(Some(new_post.excerpt)),
            featured_image: Set(new_post.featured_image),
            category: Set(new_post.category),
            tags: Set(join_tags(&new_post.tags)),
            status: Set(new_post.status.as_str().to_string()),
            view_count: Set(0),
            author_id: Set(new_post.author_id),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert post")?;

        Post::try_from(model)
    }

    /// Get post by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<Post>> {
        let post = posts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query post by ID")?;

        post.map(Post::try_from).transpose()
    }

    /// Get post by slug
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let post = posts::Entity::find()
            .filter(posts::Column::Slug.eq(slug))
            .one(&self.conn)
            .await
            .context("Failed to query post by slug")?;

        post.map(Post::try_from).transpose()
    }

    /// List posts matching the filter, newest first
    pub async fn list(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        let models = Self::filtered(filter)
            .order_by_desc(posts::Column::CreatedAt)
            .limit(filter.limit)
            .offset(filter.offset)
            .all(&self.conn)
            .await
            .context("Failed to list posts")?;

        models.into_iter().map(Post::try_from).collect()
    }

    /// Count posts matching the filter (ignores limit and offset)
    pub async fn count(&self, filter: &PostFilter) -> Result<u64> {
        Self::filtered(filter)
            .count(&self.conn)
            .await
            .context("Failed to count posts")
    }

    /// Apply changes to an existing post. Returns `None` when the post does
    /// not exist.
    pub async fn update(&self, id: i32, changes: PostChanges) -> Result<Option<Post>> {
        let post = posts::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query post for update")?;

        let Some(post) = post else {
            return Ok(None);
        };

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: posts::ActiveModel = post.into();
        active.title = Set(changes.title);
        active.content = Set(changes.content);
        active.excerpt = Set(Some(changes.excerpt));
        if let Some(slug) = changes.slug {
            active.slug = Set(slug);
        }
        if let Some(featured_image) = changes.featured_image {
            active.featured_image = Set(Some(featured_image));
        }
        if let Some(category) = changes.category {
            active.category = Set(Some(category));
        }
        if let Some(tags) = changes.tags {
            active.tags = Set(join_tags(&tags));
        }
        if let Some(status) = changes.status {
            active.status = Set(status.as_str().to_string());
        }
        active.updated_at = Set(now);

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update post")?;

        Ok(Some(Post::try_from(model)?))
    }

    /// Delete a post. Returns false when no row was removed.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = posts::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete post")?;

        Ok(result.rows_affected > 0)
    }

    /// Atomically bump a post's view counter
    pub async fn increment_views(&self, id: i32) -> Result<()> {
        posts::Entity::update_many()
            .col_expr(
                posts::Column::ViewCount,
                Expr::col(posts::Column::ViewCount).add(1),
            )
            .filter(posts::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to increment view count")?;

        Ok(())
    }

    /// Distinct non-empty categories across all posts
    pub async fn categories(&self) -> Result<Vec<String>> {
        let categories: Vec<String> = posts::Entity::find()
            .select_only()
            .column(posts::Column::Category)
            .distinct()
            .filter(posts::Column::Category.is_not_null())
            .filter(posts::Column::Category.ne(""))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query categories")?;

        Ok(categories)
    }

    /// Most viewed published posts
    pub async fn popular(&self, limit: u64) -> Result<Vec<Post>> {
        let models = posts::Entity::find()
            .filter(posts::Column::Status.eq(PostStatus::Published.as_str()))
            .order_by_desc(posts::Column::ViewCount)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to query popular posts")?;

        models.into_iter().map(Post::try_from).collect()
    }

    /// Check whether a slug is already used by another post
    pub async fn slug_taken(&self, slug: &str, exclude_id: Option<i32>) -> Result<bool> {
        let mut query = posts::Entity::find().filter(posts::Column::Slug.eq(slug));
        if let Some(id) = exclude_id {
            query = query.filter(posts::Column::Id.ne(id));
        }

        let existing = query
            .one(&self.conn)
            .await
            .context("Failed to check for existing slug")?;

        Ok(existing.is_some())
    }

    fn filtered(filter: &PostFilter) -> Select<posts::Entity> {
        let mut query =
            posts::Entity::find().filter(posts::Column::Status.eq(filter.status.as_str()));

        if let Some(category) = &filter.category {
            query = query.filter(posts::Column::Category.eq(category));
        }

        if let Some(search) = &filter.search {
            query = query.filter(
                Condition::any()
                    .add(posts::Column::Title.contains(search))
                    .add(posts::Column::Content.contains(search))
                    .add(posts::Column::Excerpt.contains(search)),
            );
        }

        query
    }
}
