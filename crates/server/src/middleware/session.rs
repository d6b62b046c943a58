//! Cookie sessions backed by `PostgreSQL`.
//!
//! A session carries the signed-in user, the cart and the wishlist, so
//! guests keep their cart until they sign in or the cookie goes idle.

use std::time::Duration;

use sqlx::PgPool;
use tower_sessions::cookie::{SameSite, time};
use tower_sessions::{ExpiredDeletion, Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::ServerConfig;

pub const SESSION_COOKIE_NAME: &str = "bazaar_session";

/// Idle time after which a session is dropped.
const IDLE_DAYS: i64 = 7;

/// How often expired rows are purged from `tower_sessions.session`.
const CLEANUP_EVERY: Duration = Duration::from_secs(60 * 60);

/// Session layer over the `PostgreSQL` store, plus a background task that
/// purges expired sessions. Must be called inside the Tokio runtime.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &ServerConfig,
) -> SessionManagerLayer<PostgresStore> {
    let store = PostgresStore::new(pool.clone());
    tokio::spawn(purge_expired(store.clone()));
    session_layer(store, config.is_https())
}

/// Session layer over any store. Tests pass an in-memory store.
#[must_use]
pub fn session_layer<S: SessionStore + Clone>(store: S, secure: bool) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(time::Duration::days(IDLE_DAYS)))
        .with_secure(secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

async fn purge_expired(store: PostgresStore) {
    let mut ticker = tokio::time::interval(CLEANUP_EVERY);
    loop {
        ticker.tick().await;
        if let Err(e) = store.delete_expired().await {
            tracing::warn!(error = %e, "Expired session cleanup failed");
        }
    }
}
