use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::guards::CurrentUser;
use super::{
    ApiError, ApiResponse, AppState, ChangePasswordRequest, CheckDto, LoginRequest,
    ProfileRequest, RefreshDto, SessionDetailsDto, SessionInfoDto, SessionUserDto, validation,
};
use crate::auth::session as auth_session;
use crate::db::ProfileChanges;

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/login
/// Authenticate with username or email and open a session.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<SessionUserDto>>, ApiError> {
    let errors = validation::validate_login(
        payload.username_or_email.as_deref(),
        payload.password.as_deref(),
    );
    if !errors.is_empty() {
        return Err(ApiError::ValidationFailed(errors));
    }

    let identifier = payload.username_or_email.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    let user = state
        .auth()
        .authenticate(identifier.trim(), &password)
        .await?;

    let session_config = state.config().read().await.session.clone();
    auth_session::establish(&session, &user, payload.remember_me, &session_config)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    tracing::info!("User {} signed in", user.username);

    Ok(Json(ApiResponse::success(SessionUserDto::from(user))))
}

/// POST /api/auth/logout
/// Destroy the current session.
pub async fn logout(
    CurrentUser(user): CurrentUser,
    session: Session,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    auth_session::clear(&session)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to destroy session: {e}")))?;

    tracing::info!("User {} signed out", user.username);

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Signed out successfully".to_string(),
    })))
}

/// GET /api/auth/me
/// Current user, as attached by the guard chain.
pub async fn me(CurrentUser(user): CurrentUser) -> Json<ApiResponse<SessionUserDto>> {
    Json(ApiResponse::success(SessionUserDto::from(user)))
}

/// GET /api/auth/check
/// Report whether the caller has a live session. Always 200; a stale
/// session is destroyed and reported as anonymous.
pub async fn check(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<CheckDto>>, ApiError> {
    let anonymous = || {
        Json(ApiResponse::success(CheckDto {
            authenticated: false,
            user: None,
        }))
    };

    let record = auth_session::record(&session)
        .await
        .map_err(|e| ApiError::internal(format!("Session read failed: {e}")))?;
    let Some(record) = record else {
        return Ok(anonymous());
    };

    let user = state
        .store()
        .get_user(record.user_id)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    match user {
        Some(user) if user.is_active => Ok(Json(ApiResponse::success(CheckDto {
            authenticated: true,
            user: Some(SessionUserDto::from(user)),
        }))),
        _ => {
            if let Err(err) = auth_session::clear(&session).await {
                tracing::warn!("Failed to destroy stale session: {err:#}");
            }
            Ok(anonymous())
        }
    }
}

/// PUT /api/auth/change-password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let errors = validation::validate_password_change(
        payload.current_password.as_deref(),
        payload.new_password.as_deref(),
        payload.confirm_password.as_deref(),
    );
    if !errors.is_empty() {
        return Err(ApiError::ValidationFailed(errors));
    }

    let current = payload.current_password.unwrap_or_default();
    let new = payload.new_password.unwrap_or_default();

    state.auth().change_password(user.id, &current, &new).await?;

    tracing::info!("User {} changed their password", user.username);

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password updated successfully".to_string(),
    })))
}

/// PUT /api/auth/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ProfileRequest>,
) -> Result<Json<ApiResponse<SessionUserDto>>, ApiError> {
    validation::validate_profile(payload.display_name.as_deref(), payload.bio.as_deref())
        .map_err(ApiError::ValidationError)?;

    let changes = ProfileChanges {
        display_name: payload.display_name.map(|v| v.trim().to_string()),
        bio: payload.bio.map(|v| v.trim().to_string()),
        avatar: payload.avatar.map(|v| v.trim().to_string()),
    };

    let updated = state.auth().update_profile(user.id, changes).await?;

    tracing::info!("User {} updated their profile", updated.username);

    Ok(Json(ApiResponse::success(SessionUserDto::from(updated))))
}

/// GET /api/auth/session-info
pub async fn session_info(
    CurrentUser(user): CurrentUser,
    session: Session,
) -> Result<Json<ApiResponse<SessionDetailsDto>>, ApiError> {
    let record = auth_session::record(&session)
        .await
        .map_err(|e| ApiError::internal(format!("Session read failed: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

    let info = SessionInfoDto {
        session_id: session.id().map(|id| id.to_string()).unwrap_or_default(),
        user_id: record.user_id,
        username: record.username,
        expires_at: record.expires_at,
        remember: record.remember,
    };

    Ok(Json(ApiResponse::success(SessionDetailsDto {
        session: info,
        user: SessionUserDto::from(user),
    })))
}

/// POST /api/auth/refresh-session
/// Extend the session from now, keeping its remember-me horizon.
pub async fn refresh_session(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<RefreshDto>>, ApiError> {
    let session_config = state.config().read().await.session.clone();

    let expires_at = auth_session::refresh(&session, &session_config)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to refresh session: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

    Ok(Json(ApiResponse::success(RefreshDto { expires_at })))
}
