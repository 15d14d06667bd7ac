use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use crate::auth::roles::Role;
use crate::entities::users;

/// User data returned from repository (without sensitive password hash)
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<users::Model> for User {
    type Error = anyhow::Error;

    fn try_from(model: users::Model) -> Result<Self, Self::Error> {
        let role = Role::parse(&model.role).with_context(|| {
            format!(
                "Unknown role stored for user {}: {}",
                model.username, model.role
            )
        })?;

        Ok(Self {
            id: model.id,
            username: model.username,
            email: model.email,
            display_name: model.display_name,
            bio: model.bio,
            avatar: model.avatar,
            role,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// Fields required to insert a new user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub role: Role,
}

/// Profile fields a user may change. Absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

impl ProfileChanges {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.bio.is_none() && self.avatar.is_none()
    }
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        user.map(User::try_from).transpose()
    }

    /// Get user by username
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        user.map(User::try_from).transpose()
    }

    /// Look up an active user by username or email, returning the stored
    /// password hash alongside for credential verification.
    pub async fn get_active_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<(User, String)>> {
        let user = users::Entity::find()
            .filter(
                Condition::any()
                    .add(users::Column::Username.eq(identifier))
                    .add(users::Column::Email.eq(identifier)),
            )
            .filter(users::Column::IsActive.eq(true))
            .one(&self.conn)
            .await
            .context("Failed to query user by identifier")?;

        user.map(|u| {
            let password_hash = u.password_hash.clone();
            Ok((User::try_from(u)?, password_hash))
        })
        .transpose()
    }

    /// Get user by ID with password hash (for password changes)
    pub async fn get_with_password(&self, id: i32) -> Result<Option<(User, String)>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        user.map(|u| {
            let password_hash = u.password_hash.clone();
            Ok((User::try_from(u)?, password_hash))
        })
        .transpose()
    }

    /// Check whether a username or email is already taken
    pub async fn identifier_taken(&self, username: &str, email: &str) -> Result<bool> {
        let existing = users::Entity::find()
            .filter(
                Condition::any()
                    .add(users::Column::Username.eq(username))
                    .add(users::Column::Email.eq(email)),
            )
            .one(&self.conn)
            .await
            .context("Failed to check for existing user")?;

        Ok(existing.is_some())
    }

    /// Insert a new user. The display name falls back to the username when
    /// not given, matching how accounts are provisioned.
    pub async fn create(&self, new_user: NewUser) -> Result<User> {
        let now = chrono::Utc::now().to_rfc3339();
        let display_name = new_user
            .display_name
            .unwrap_or_else(|| new_user.username.clone());

        let active = users::ActiveModel {
            username: Set(new_user.username),
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            display_name: Set(Some(display_name)),
            bio: Set(None),
            avatar: Set(None),
            role: Set(new_user.role.as_str().to_string()),
            is_active: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert user")?;

        User::try_from(model)
    }

    /// Replace the stored password hash for a user
    pub async fn update_password(&self, id: i32, new_hash: String) -> Result<()> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Apply profile changes to a user, leaving absent fields untouched
    pub async fn update_profile(&self, id: i32, changes: ProfileChanges) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for profile update")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: users::ActiveModel = user.into();
        if let Some(display_name) = changes.display_name {
            active.display_name = Set(Some(display_name));
        }
        if let Some(bio) = changes.bio {
            active.bio = Set(Some(bio));
        }
        if let Some(avatar) = changes.avatar {
            active.avatar = Set(Some(avatar));
        }
        active.updated_at = Set(now);

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update user profile")?;

        Ok(Some(User::try_from(model)?))
    }

    /// Bump a user's `updated_at` to now (recorded on successful login)
    pub async fn touch_updated_at(&self, id: i32) -> Result<()> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user for timestamp update")?;

        let Some(user) = user else {
            return Ok(());
        };

        let mut active: users::ActiveModel = user.into();
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Deactivate a user account. Returns false when no such user exists.
    pub async fn deactivate(&self, username: &str) -> Result<bool> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for deactivation")?;

        let Some(user) = user else {
            return Ok(false);
        };

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: users::ActiveModel = user.into();
        active.is_active = Set(false);
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(true)
    }

    /// List all users, newest first
    pub async fn list(&self) -> Result<Vec<User>> {
        let models = users::Entity::find()
            .order_by_desc(users::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to list users")?;

        models.into_iter().map(User::try_from).collect()
    }
}
