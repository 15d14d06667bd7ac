//! Ordered guard chains evaluated before protected handlers.
//!
//! Every route group names an explicit chain; guards run left to right and
//! the first rejection wins. `RequireAuth` is the only guard that resolves
//! the session against the user table, later guards read the identity it
//! attached to the request.

use axum::{
    Json,
    extract::{FromRequestParts, RawPathParams, Request, State},
    http::{StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState};
use crate::auth::roles::{self, Permission, Role};
use crate::auth::session as auth_session;
use crate::db::User;

#[derive(Debug, Clone, Copy)]
pub enum Guard {
    /// Resolve the session to an active user, 401 otherwise.
    RequireAuth,
    /// Reject signed-in callers with 400.
    RequireGuest,
    /// Attach the identity when the session is valid, never reject.
    OptionalAuth,
    /// Allow only identities whose role is in the list.
    RequireRole(&'static [Role]),
    /// Allow only identities holding the permission.
    RequirePermission(Permission),
    /// Admins and editors may touch any post, authors only their own.
    RequirePostEdit,
}

pub const AUTHENTICATED: &[Guard] = &[Guard::RequireAuth];
pub const GUEST_ONLY: &[Guard] = &[Guard::RequireGuest];
pub const PUBLIC_READ: &[Guard] = &[Guard::OptionalAuth];
pub const POST_CREATE: &[Guard] = &[
    Guard::RequireAuth,
    Guard::RequirePermission(Permission::CreatePosts),
];
pub const POST_EDIT: &[Guard] = &[Guard::RequireAuth, Guard::RequirePostEdit];

/// Identity attached to the request once its chain has passed.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub identity: Option<User>,
}

/// Response produced by the first failing guard.
#[derive(Debug)]
pub struct Rejection {
    status: StatusCode,
    message: String,
}

impl Rejection {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn unauthenticated() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Authentication required")
    }

    fn from_store(err: anyhow::Error) -> Self {
        tracing::error!("Guard chain lookup failed: {err:#}");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "An internal error occurred",
        )
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()>::error(self.message);
        (self.status, Json(body)).into_response()
    }
}

/// Axum middleware wrapping a route group with its guard chain.
pub async fn apply(
    State((state, chain)): State<(Arc<AppState>, &'static [Guard])>,
    params: RawPathParams,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let post_id = params
        .iter()
        .find(|&(name, _)| name == "id")
        .and_then(|(_, value)| value.parse::<i32>().ok());

    match run_chain(&state, &session, chain, post_id).await {
        Ok(context) => {
            if let Some(user) = &context.identity {
                tracing::Span::current().record("user_id", i64::from(user.id));
            }
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(rejection) => rejection.into_response(),
    }
}

/// Evaluate a chain left to right, short-circuiting on the first rejection.
pub async fn run_chain(
    state: &AppState,
    session: &Session,
    chain: &[Guard],
    post_id: Option<i32>,
) -> Result<RequestContext, Rejection> {
    let mut context = RequestContext { identity: None };

    for guard in chain {
        match guard {
            Guard::RequireAuth => {
                context.identity = Some(require_identity(state, session).await?);
            }
            Guard::RequireGuest => {
                let record = auth_session::record(session)
                    .await
                    .map_err(Rejection::from_store)?;
                if record.is_some() {
                    return Err(Rejection::new(
                        StatusCode::BAD_REQUEST,
                        "You already have an active session",
                    ));
                }
            }
            Guard::OptionalAuth => {
                context.identity = optional_identity(state, session).await;
            }
            Guard::RequireRole(allowed) => {
                let user = context
                    .identity
                    .as_ref()
                    .ok_or_else(Rejection::unauthenticated)?;
                if !allowed.contains(&user.role) {
                    return Err(Rejection::new(
                        StatusCode::FORBIDDEN,
                        "Insufficient permissions",
                    ));
                }
            }
            Guard::RequirePermission(permission) => {
                let user = context
                    .identity
                    .as_ref()
                    .ok_or_else(Rejection::unauthenticated)?;
                if !roles::has_permission(user.role, *permission) {
                    return Err(Rejection::new(
                        StatusCode::FORBIDDEN,
                        "You do not have permission for this action",
                    ));
                }
            }
            Guard::RequirePostEdit => {
                let user = context
                    .identity
                    .as_ref()
                    .ok_or_else(Rejection::unauthenticated)?;
                // Only authors need the ownership lookup.
                if matches!(user.role, Role::Author) {
                    let id = post_id.ok_or_else(|| {
                        Rejection::new(StatusCode::BAD_REQUEST, "Post id is required")
                    })?;
                    let post = state
                        .store()
                        .get_post(id)
                        .await
                        .map_err(Rejection::from_store)?
                        .ok_or_else(|| Rejection::new(StatusCode::NOT_FOUND, "Post not found"))?;
                    if !roles::can_edit_post(user.role, user.id, post.author_id) {
                        return Err(Rejection::new(
                            StatusCode::FORBIDDEN,
                            "You can only edit your own posts",
                        ));
                    }
                }
            }
        }
    }

    Ok(context)
}

/// Resolve the session to an active user or reject. Stale records pointing
/// at missing or deactivated users destroy the session before rejecting.
async fn require_identity(state: &AppState, session: &Session) -> Result<User, Rejection> {
    let record = auth_session::record(session)
        .await
        .map_err(Rejection::from_store)?
        .ok_or_else(Rejection::unauthenticated)?;

    let user = state
        .store()
        .get_user(record.user_id)
        .await
        .map_err(Rejection::from_store)?;

    let Some(user) = user else {
        discard(session).await;
        return Err(Rejection::new(
            StatusCode::UNAUTHORIZED,
            "Session is no longer valid. Please sign in again",
        ));
    };

    if !user.is_active {
        discard(session).await;
        return Err(Rejection::new(
            StatusCode::UNAUTHORIZED,
            "Account is deactivated",
        ));
    }

    Ok(user)
}

/// Best-effort identity resolution. Lookup failures are logged and treated
/// as anonymous.
async fn optional_identity(state: &AppState, session: &Session) -> Option<User> {
    let record = match auth_session::record(session).await {
        Ok(record) => record?,
        Err(err) => {
            tracing::warn!("Optional auth session read failed: {err:#}");
            return None;
        }
    };

    match state.store().get_user(record.user_id).await {
        Ok(Some(user)) if user.is_active => Some(user),
        Ok(_) => None,
        Err(err) => {
            tracing::warn!("Optional auth user lookup failed: {err:#}");
            None
        }
    }
}

async fn discard(session: &Session) {
    if let Err(err) = auth_session::clear(session).await {
        tracing::warn!("Failed to destroy stale session: {err:#}");
    }
}

/// Extractor handing handlers the identity their chain attached.
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .and_then(|context| context.identity.clone())
            .map(CurrentUser)
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::create_app_state_from_config;
    use crate::config::Config;
    use crate::db::NewUser;
    use tower_sessions::MemoryStore;

    async fn test_state() -> Arc<AppState> {
        let mut config = Config::default();
        config.general.database_path = "sqlite::memory:".to_string();
        create_app_state_from_config(config, None)
            .await
            .expect("Failed to create test state")
    }

    fn test_session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    async fn seeded_user(state: &AppState, username: &str, role: Role) -> User {
        state
            .store()
            .create_user(NewUser {
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash: "x".to_string(),
                display_name: None,
                role,
            })
            .await
            .expect("Failed to seed user")
    }

    async fn signed_in_session(state: &AppState, user: &User) -> Session {
        let session = test_session();
        auth_session::establish(&session, user, false, &state.config().read().await.session)
            .await
            .expect("Failed to establish session");
        session
    }

    #[tokio::test]
    async fn test_require_auth_without_session() {
        let state = test_state().await;
        let session = test_session();

        let err = run_chain(&state, &session, AUTHENTICATED, None)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_require_auth_attaches_identity() {
        let state = test_state().await;
        let user = seeded_user(&state, "guard_auth", Role::Author).await;
        let session = signed_in_session(&state, &user).await;

        let context = run_chain(&state, &session, AUTHENTICATED, None)
            .await
            .unwrap();
        assert_eq!(context.identity.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn test_require_auth_rejects_deactivated_user() {
        let state = test_state().await;
        let user = seeded_user(&state, "guard_inactive", Role::Author).await;
        let session = signed_in_session(&state, &user).await;

        state.store().deactivate_user(&user.username).await.unwrap();

        let err = run_chain(&state, &session, AUTHENTICATED, None)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);

        // The stale record is gone, so the session no longer counts as active.
        assert!(auth_session::record(&session).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_require_guest_rejects_active_session() {
        let state = test_state().await;
        let user = seeded_user(&state, "guard_guest", Role::Author).await;
        let session = signed_in_session(&state, &user).await;

        let err = run_chain(&state, &session, GUEST_ONLY, None)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_optional_auth_never_rejects() {
        let state = test_state().await;
        let session = test_session();

        let context = run_chain(&state, &session, PUBLIC_READ, None).await.unwrap();
        assert!(context.identity.is_none());
    }

    #[tokio::test]
    async fn test_require_role_forbids_outsiders() {
        let state = test_state().await;
        let user = seeded_user(&state, "guard_role", Role::Author).await;
        let session = signed_in_session(&state, &user).await;

        const ADMIN_ONLY: &[Guard] = &[Guard::RequireAuth, Guard::RequireRole(&[Role::Admin])];
        let err = run_chain(&state, &session, ADMIN_ONLY, None)
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        const AUTHOR_OK: &[Guard] = &[
            Guard::RequireAuth,
            Guard::RequireRole(&[Role::Admin, Role::Author]),
        ];
        assert!(run_chain(&state, &session, AUTHOR_OK, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_require_role_without_auth_is_unauthorized() {
        let state = test_state().await;
        let session = test_session();

        const CHAIN: &[Guard] = &[Guard::RequireRole(&[Role::Admin])];
        let err = run_chain(&state, &session, CHAIN, None).await.unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_require_permission_matrix() {
        let state = test_state().await;
        let author = seeded_user(&state, "guard_perm_author", Role::Author).await;
        let session = signed_in_session(&state, &author).await;

        assert!(run_chain(&state, &session, POST_CREATE, None).await.is_ok());

        const MANAGE: &[Guard] = &[
            Guard::RequireAuth,
            Guard::RequirePermission(Permission::ManageUsers),
        ];
        let err = run_chain(&state, &session, MANAGE, None).await.unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_post_edit_ownership_chain() {
        let state = test_state().await;
        let owner = seeded_user(&state, "guard_owner", Role::Author).await;
        let other = seeded_user(&state, "guard_other", Role::Author).await;
        let editor = seeded_user(&state, "guard_editor", Role::Editor).await;

        let post = state
            .store()
            .create_post(crate::db::NewPost {
                title: "Guarded".to_string(),
                slug: "guarded".to_string(),
                content: "body".to_string(),
                excerpt: "body".to_string(),
                featured_image: None,
                category: None,
                tags: Vec::new(),
                status: crate::models::post::PostStatus::Published,
                author_id: owner.id,
            })
            .await
            .unwrap();

        // Missing path id.
        let session = signed_in_session(&state, &owner).await;
        let err = run_chain(&state, &session, POST_EDIT, None).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        // Unknown post.
        let err = run_chain(&state, &session, POST_EDIT, Some(9999))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);

        // Owner passes, another author does not, editors always do.
        assert!(
            run_chain(&state, &session, POST_EDIT, Some(post.id))
                .await
                .is_ok()
        );

        let session = signed_in_session(&state, &other).await;
        let err = run_chain(&state, &session, POST_EDIT, Some(post.id))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let session = signed_in_session(&state, &editor).await;
        assert!(
            run_chain(&state, &session, POST_EDIT, Some(post.id))
                .await
                .is_ok()
        );
    }
}
