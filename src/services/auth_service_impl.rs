//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use tokio::task;

use crate::auth::password::{hash_password, verify_password};
use crate::config::SecurityConfig;
use crate::db::{NewUser, ProfileChanges, Store, User};
use crate::services::auth_service::{AuthError, AuthService, NewAccount};

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    /// Hash a password on a blocking thread. Argon2 is CPU-intensive and
    /// would stall the async runtime if run inline.
    async fn hash_in_background(&self, password: String) -> Result<String, AuthError> {
        let config = self.security.clone();
        task::spawn_blocking(move || hash_password(&password, Some(&config)))
            .await
            .map_err(|e| AuthError::Internal(format!("Password hashing task panicked: {e}")))?
            .map_err(AuthError::from)
    }

    async fn verify_in_background(
        password: String,
        password_hash: String,
    ) -> Result<bool, AuthError> {
        task::spawn_blocking(move || verify_password(&password, &password_hash))
            .await
            .map_err(|e| AuthError::Internal(format!("Password verification task panicked: {e}")))?
            .map_err(AuthError::from)
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn authenticate(&self, identifier: &str, password: &str) -> Result<User, AuthError> {
        // A missing account and a wrong password must be indistinguishable
        // to the caller.
        let Some((user, password_hash)) = self
            .store
            .get_active_user_by_identifier(identifier)
            .await?
        else {
            return Err(AuthError::InvalidCredentials);
        };

        let is_valid = Self::verify_in_background(password.to_string(), password_hash).await?;
        if !is_valid {
            return Err(AuthError::InvalidCredentials);
        }

        // Record the login time
        self.store.touch_user_updated_at(user.id).await?;

        Ok(user)
    }

    async fn get_user(&self, id: i32) -> Result<Option<User>, AuthError> {
        Ok(self.store.get_user(id).await?)
    }

    async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if new_password.len() < 6 {
            return Err(AuthError::Validation(
                "New password must be at least 6 characters".to_string(),
            ));
        }

        let (_, password_hash) = self
            .store
            .get_user_with_password(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let is_valid =
            Self::verify_in_background(current_password.to_string(), password_hash).await?;
        if !is_valid {
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        let new_hash = self.hash_in_background(new_password.to_string()).await?;
        self.store.update_user_password(user_id, new_hash).await?;

        Ok(())
    }

    async fn update_profile(
        &self,
        user_id: i32,
        changes: ProfileChanges,
    ) -> Result<User, AuthError> {
        if changes.is_empty() {
            return Err(AuthError::Validation(
                "No profile fields provided".to_string(),
            ));
        }

        let user = self
            .store
            .update_user_profile(user_id, changes)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(user)
    }

    async fn create_account(&self, account: NewAccount) -> Result<User, AuthError> {
        if account.username.trim().is_empty() || account.password.is_empty() {
            return Err(AuthError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        if account.password.len() < 6 {
            return Err(AuthError::Validation(
                "Password must be at least 6 characters".to_string(),
            ));
        }

        let email = account
            .email
            .unwrap_or_else(|| format!("{}@blog.local", account.username));

        if self
            .store
            .user_identifier_taken(&account.username, &email)
            .await?
        {
            return Err(AuthError::AlreadyExists(account.username));
        }

        let password_hash = self.hash_in_background(account.password).await?;

        let user = self
            .store
            .create_user(NewUser {
                username: account.username,
                email,
                password_hash,
                display_name: account.display_name,
                role: account.role,
            })
            .await?;

        Ok(user)
    }
}
