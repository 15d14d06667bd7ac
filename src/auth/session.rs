//! Session record helpers shared by the login handlers and the guard chain.
//!
//! The record itself lives in the SQLite-backed session store managed by
//! `tower-sessions`; these helpers only read and write the identity payload
//! and pin the expiry. Validity against the user table is the guard chain's
//! job, and expired or orphaned records are removed lazily when a guard
//! first sees them.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime, format_description::well_known::Rfc3339};
use tower_sessions::{Expiry, Session};

use crate::config::SessionConfig;
use crate::db::repositories::user::User;

/// Session key holding the signed-in identity record.
const AUTH_KEY: &str = "auth";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: i32,
    /// Cached for log lines; authorization always reloads the user row.
    pub username: String,
    /// Whether the session was created with "remember me".
    pub remember: bool,
    /// RFC 3339 expiry, re-pinned on refresh.
    pub expires_at: String,
}

/// Session lifetime for a login, honoring the remember-me flag.
#[must_use]
pub fn lifetime(remember: bool, config: &SessionConfig) -> Duration {
    if remember {
        Duration::days(config.remember_ttl_days as i64)
    } else {
        Duration::hours(config.default_ttl_hours as i64)
    }
}

/// Establish a fresh signed-in session and pin its expiry.
/// Returns the RFC 3339 expiry so handlers can report it.
pub async fn establish(
    session: &Session,
    user: &User,
    remember: bool,
    config: &SessionConfig,
) -> Result<String> {
    let expires_at = OffsetDateTime::now_utc() + lifetime(remember, config);
    let record = SessionRecord {
        user_id: user.id,
        username: user.username.clone(),
        remember,
        expires_at: format_expiry(expires_at),
    };

    session
        .insert(AUTH_KEY, &record)
        .await
        .context("Failed to write session record")?;
    session.set_expiry(Some(Expiry::AtDateTime(expires_at)));

    Ok(record.expires_at)
}

/// Read the identity record, if any.
pub async fn record(session: &Session) -> Result<Option<SessionRecord>> {
    session
        .get::<SessionRecord>(AUTH_KEY)
        .await
        .context("Failed to read session record")
}

/// Destroy the session and its stored record. Idempotent.
pub async fn clear(session: &Session) -> Result<()> {
    session.flush().await.context("Failed to destroy session")
}

/// Extend the session from now, keeping its remember-me horizon.
/// Returns the new RFC 3339 expiry, or `None` when nobody is signed in.
pub async fn refresh(session: &Session, config: &SessionConfig) -> Result<Option<String>> {
    let Some(mut existing) = record(session).await? else {
        return Ok(None);
    };

    let expires_at = OffsetDateTime::now_utc() + lifetime(existing.remember, config);
    existing.expires_at = format_expiry(expires_at);

    session
        .insert(AUTH_KEY, &existing)
        .await
        .context("Failed to update session record")?;
    session.set_expiry(Some(Expiry::AtDateTime(expires_at)));

    Ok(Some(existing.expires_at))
}

/// RFC 3339 rendering used in session payloads.
#[must_use]
pub fn format_expiry(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| at.to_string())
}
