//! Domain service for authentication and account management.
//!
//! Handles credential verification, password changes, profile updates, and
//! account provisioning.

use thiserror::Error;

use crate::auth::roles::Role;
use crate::db::{ProfileChanges, User};

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Account already exists: {0}")]
    AlreadyExists(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Fields for provisioning a new account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    /// Defaults to `{username}@blog.local` when not given.
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub role: Role,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials against an active account. The identifier may be
    /// a username or an email address.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown identifier,
    /// an inactive account, and a wrong password alike.
    async fn authenticate(&self, identifier: &str, password: &str) -> Result<User, AuthError>;

    /// Looks up a user by ID.
    async fn get_user(&self, id: i32) -> Result<Option<User>, AuthError>;

    /// Changes a user's password after verifying the current one.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if the current password is incorrect
    /// or the new password is too short.
    async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    /// Applies profile changes and returns the updated user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] when no fields were provided.
    async fn update_profile(
        &self,
        user_id: i32,
        changes: ProfileChanges,
    ) -> Result<User, AuthError>;

    /// Provisions a new account with a freshly hashed password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::AlreadyExists`] when the username or email is
    /// taken.
    async fn create_account(&self, account: NewAccount) -> Result<User, AuthError>;
}
