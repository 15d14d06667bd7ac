use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;

use crate::config::Config;
use crate::state::SharedState;

mod assets;
pub mod auth;
mod error;
pub mod guards;
mod observability;
mod posts;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

use tokio::sync::RwLock;

use crate::services::{AuthService, PostService, SeaOrmAuthService, SeaOrmPostService};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub auth_service: Arc<dyn AuthService>,

    pub post_service: Arc<dyn PostService>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth(&self) -> &Arc<dyn AuthService> {
        &self.auth_service
    }

    #[must_use]
    pub fn posts(&self) -> &Arc<dyn PostService> {
        &self.post_service
    }
}

pub async fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let config = shared.config.read().await.clone();

    let auth_service: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(
        shared.store.clone(),
        config.security.clone(),
    ));

    let post_service: Arc<dyn PostService> =
        Arc::new(SeaOrmPostService::new(shared.store.clone()));

    Ok(Arc::new(AppState {
        shared,
        auth_service,
        post_service,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared, prometheus_handle).await
}

pub async fn router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let (session_config, server_config) = {
        let config = state.config().read().await;
        (config.session.clone(), config.server.clone())
    };

    // Sessions live in the same SQLite database as everything else.
    let session_store = SqliteStore::new(state.store().conn.get_sqlite_connection_pool().clone());
    session_store
        .migrate()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to migrate session store: {e}"))?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_name(session_config.cookie_name.clone())
        .with_http_only(true)
        .with_secure(server_config.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(
            session_config.default_ttl_hours as i64,
        )));

    let guest_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route_layer(middleware::from_fn_with_state(
            (state.clone(), guards::GUEST_ONLY),
            guards::apply,
        ));

    let account_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/change-password", put(auth::change_password))
        .route("/auth/profile", put(auth::update_profile))
        .route("/auth/session-info", get(auth::session_info))
        .route("/auth/refresh-session", post(auth::refresh_session))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(
            (state.clone(), guards::AUTHENTICATED),
            guards::apply,
        ));

    let post_create_routes = Router::new()
        .route("/posts", post(posts::create_post))
        .route_layer(middleware::from_fn_with_state(
            (state.clone(), guards::POST_CREATE),
            guards::apply,
        ));

    let post_edit_routes = Router::new()
        .route("/posts/{id}", put(posts::update_post))
        .route("/posts/{id}", delete(posts::delete_post))
        .route_layer(middleware::from_fn_with_state(
            (state.clone(), guards::POST_EDIT),
            guards::apply,
        ));

    let public_post_routes = Router::new()
        .route("/posts", get(posts::list_posts))
        .route("/posts/{id}", get(posts::get_post))
        .route("/posts/slug/{slug}", get(posts::get_post_by_slug))
        .route_layer(middleware::from_fn_with_state(
            (state.clone(), guards::PUBLIC_READ),
            guards::apply,
        ));

    let open_routes = Router::new()
        .route("/auth/check", get(auth::check))
        .route("/posts/meta/categories", get(posts::list_categories))
        .route("/posts/meta/popular", get(posts::list_popular))
        .route("/health", get(observability::health));

    let api_router = Router::new()
        .merge(guest_routes)
        .merge(account_routes)
        .merge(post_create_routes)
        .merge(post_edit_routes)
        .merge(public_post_routes)
        .merge(open_routes)
        .layer(session_layer)
        .with_state(state.clone());

    let cors_layer = if server_config.cors_allowed_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = server_config
            .cors_allowed_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins)
    };

    Ok(Router::new()
        .nest("/api", api_router)
        .fallback(assets::serve_asset)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
        .layer(middleware::from_fn(observability::logging_middleware)))
}
