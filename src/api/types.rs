use serde::{Deserialize, Serialize};

use crate::auth::roles::Role;
use crate::db::User;
use crate::models::post::{Post, PostStatus};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            errors: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            errors: None,
        }
    }

    pub fn validation_errors(message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            errors: Some(errors),
        }
    }
}

/// A single field-level validation failure.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// The redacted view of a user that may be sent to clients. The password
/// hash never leaves the server.
#[derive(Debug, Clone, Serialize)]
pub struct SessionUserDto {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub is_active: bool,
}

impl From<User> for SessionUserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            display_name: user.display_name,
            role: user.role,
            is_active: user.is_active,
        }
    }
}

impl From<&User> for SessionUserDto {
    fn from(user: &User) -> Self {
        Self::from(user.clone())
    }
}

#[derive(Debug, Serialize)]
pub struct PostDto {
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

impl From<Post> for PostDto {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            content: post.content,
            excerpt: post.excerpt,
            featured_image: post.featured_image,
            category: post.category,
            tags: post.tags,
            status: post.status,
            view_count: post.view_count,
            author_id: post.author_id,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaginationDto {
    pub page: u64,
    pub limit: u64,
    pub total_count: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct PostListDto {
    pub posts: Vec<PostDto>,
    pub pagination: PaginationDto,
}

#[derive(Debug, Serialize)]
pub struct CheckDto {
    pub authenticated: bool,
    pub user: Option<SessionUserDto>,
}

#[derive(Debug, Serialize)]
pub struct SessionInfoDto {
    pub session_id: String,
    pub user_id: i32,
    pub username: String,
    pub expires_at: String,
    pub remember: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionDetailsDto {
    pub session: SessionInfoDto,
    pub user: SessionUserDto,
}

#[derive(Debug, Serialize)]
pub struct RefreshDto {
    pub expires_at: String,
}

// ============================================================================
// Request payloads
// ============================================================================
//
// Fields are optional so missing ones surface as field-level validation
// errors instead of a bare deserialization failure.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username_or_email: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

/// Tags arrive either as a JSON array or a single comma-separated string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagsField {
    Many(Vec<String>),
    One(String),
}

impl TagsField {
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::Many(tags) => tags,
            Self::One(raw) => crate::models::post::split_tags(Some(&raw)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub featured_image: Option<String>,
    pub category: Option<String>,
    pub tags: Option<TagsField>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    pub limit: Option<u64>,
}
