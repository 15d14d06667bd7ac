pub mod slug;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, NewAccount};
pub use auth_service_impl::SeaOrmAuthService;

pub mod post_service;
pub mod post_service_impl;
pub use post_service::{PostDraft, PostError, PostPage, PostQuery, PostService};
pub use post_service_impl::SeaOrmPostService;
