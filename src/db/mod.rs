use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::models::post::Post;

pub mod migrator;
pub mod repositories;

pub use repositories::post::{NewPost, PostChanges, PostFilter};
pub use repositories::user::{NewUser, ProfileChanges, User};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn post_repo(&self) -> repositories::post::PostRepository {
        repositories::post::PostRepository::new(self.conn.clone())
    }

    // ========== User Repository Methods ==========

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_active_user_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Option<(User, String)>> {
        self.user_repo().get_active_by_identifier(identifier).await
    }

    pub async fn get_user_with_password(&self, id: i32) -> Result<Option<(User, String)>> {
        self.user_repo().get_with_password(id).await
    }

    pub async fn user_identifier_taken(&self, username: &str, email: &str) -> Result<bool> {
        self.user_repo().identifier_taken(username, email).await
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<User> {
        self.user_repo().create(new_user).await
    }

    pub async fn update_user_password(&self, id: i32, new_hash: String) -> Result<()> {
        self.user_repo().update_password(id, new_hash).await
    }

    pub async fn update_user_profile(
        &self,
        id: i32,
        changes: ProfileChanges,
    ) -> Result<Option<User>> {
        self.user_repo().update_profile(id, changes).await
    }

    pub async fn touch_user_updated_at(&self, id: i32) -> Result<()> {
        self.user_repo().touch_updated_at(id).await
    }

    pub async fn deactivate_user(&self, username: &str) -> Result<bool> {
        self.user_repo().deactivate(username).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.user_repo().list().await
    }

    // ========== Post Repository Methods ==========

    pub async fn create_post(&self, new_post: NewPost) -> Result<Post> {
        self.post_repo().create(new_post).await
    }

    pub async fn get_post(&self, id: i32) -> Result<Option<Post>> {
        self.post_repo().get_by_id(id).await
    }

    pub async fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        self.post_repo().get_by_slug(slug).await
    }

    pub async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        self.post_repo().list(filter).await
    }

    pub async fn count_posts(&self, filter: &PostFilter) -> Result<u64> {
        self.post_repo().count(filter).await
    }

    pub async fn update_post(&self, id: i32, changes: PostChanges) -> Result<Option<Post>> {
        self.post_repo().update(id, changes).await
    }

    pub async fn delete_post(&self, id: i32) -> Result<bool> {
        self.post_repo().delete(id).await
    }

    pub async fn increment_post_views(&self, id: i32) -> Result<()> {
        self.post_repo().increment_views(id).await
    }

    pub async fn post_categories(&self) -> Result<Vec<String>> {
        self.post_repo().categories().await
    }

    pub async fn popular_posts(&self, limit: u64) -> Result<Vec<Post>> {
        self.post_repo().popular(limit).await
    }

    pub async fn post_slug_taken(&self, slug: &str, exclude_id: Option<i32>) -> Result<bool> {
        self.post_repo().slug_taken(slug, exclude_id).await
    }
}
