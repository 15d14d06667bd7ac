use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::auth::MessageResponse;
use super::guards::CurrentUser;
use super::{
    ApiError, ApiResponse, AppState, ListQuery, PaginationDto, PopularQuery, PostDto, PostListDto,
    PostRequest, TagsField, validation,
};
use crate::models::post::PostStatus;
use crate::services::{PostDraft, PostQuery};

const DEFAULT_PAGE_SIZE: u64 = 10;
const MAX_PAGE_SIZE: u64 = 100;
const DEFAULT_POPULAR_LIMIT: u64 = 5;

/// GET /api/posts
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PostListDto>>, ApiError> {
    let status = match query.status.as_deref() {
        None => PostStatus::Published,
        Some(value) => PostStatus::parse(value).ok_or_else(|| {
            ApiError::validation("Status must be draft, published, or archived")
        })?,
    };

    let page = state
        .posts()
        .list(PostQuery {
            page: query.page.unwrap_or(1),
            limit: query.limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE),
            status,
            category: query.category,
            search: query.search,
        })
        .await?;

    Ok(Json(ApiResponse::success(PostListDto {
        posts: page.posts.into_iter().map(PostDto::from).collect(),
        pagination: PaginationDto {
            page: page.page,
            limit: page.limit,
            total_count: page.total_count,
            total_pages: page.total_pages,
        },
    })))
}

/// GET /api/posts/{id}
/// Reading a post bumps its view counter.
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<PostDto>>, ApiError> {
    let post = state.posts().get(id).await?;
    state.posts().record_view(id).await;

    Ok(Json(ApiResponse::success(PostDto::from(post))))
}

/// GET /api/posts/slug/{slug}
pub async fn get_post_by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<PostDto>>, ApiError> {
    let post = state.posts().get_by_slug(&slug).await?;
    state.posts().record_view(post.id).await;

    Ok(Json(ApiResponse::success(PostDto::from(post))))
}

/// POST /api/posts
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<PostRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PostDto>>), ApiError> {
    let draft = validated_draft(payload)?;

    let post = state.posts().create(user.id, draft).await?;

    tracing::info!("User {} created post {} ({})", user.username, post.id, post.slug);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(PostDto::from(post))),
    ))
}

/// PUT /api/posts/{id}
/// Ownership was already settled by the guard chain.
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<PostRequest>,
) -> Result<Json<ApiResponse<PostDto>>, ApiError> {
    let draft = validated_draft(payload)?;

    let post = state.posts().update(id, draft).await?;

    Ok(Json(ApiResponse::success(PostDto::from(post))))
}

/// DELETE /api/posts/{id}
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.posts().delete(id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Post deleted successfully".to_string(),
    })))
}

/// GET /api/posts/meta/categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let categories = state.posts().categories().await?;
    Ok(Json(ApiResponse::success(categories)))
}

/// GET /api/posts/meta/popular
pub async fn list_popular(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PopularQuery>,
) -> Result<Json<ApiResponse<Vec<PostDto>>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_POPULAR_LIMIT)
        .min(MAX_PAGE_SIZE);

    let posts = state.posts().popular(limit).await?;

    Ok(Json(ApiResponse::success(
        posts.into_iter().map(PostDto::from).collect(),
    )))
}

/// Validate an incoming payload and shape it into a draft.
fn validated_draft(payload: PostRequest) -> Result<PostDraft, ApiError> {
    let errors = validation::validate_post(
        payload.title.as_deref(),
        payload.content.as_deref(),
        payload.status.as_deref(),
        payload.category.as_deref(),
    );
    if !errors.is_empty() {
        return Err(ApiError::ValidationFailed(errors));
    }

    // Validation guarantees title and content exist and the status parses.
    let status = payload.status.as_deref().and_then(PostStatus::parse);

    Ok(PostDraft {
        title: payload.title.unwrap_or_default().trim().to_string(),
        content: payload.content.unwrap_or_default().trim().to_string(),
        excerpt: payload.excerpt,
        featured_image: payload.featured_image,
        category: payload.category,
        tags: payload.tags.map(TagsField::into_vec),
        status,
    })
}
