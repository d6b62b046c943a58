//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use crate::ai::{AiAssistant, AiError, FixedWindowLimiter, LlmClient};
use crate::config::{CommerceConfig, ServerConfig};
use crate::db::{BannerRepository, CategoryRepository, RepositoryError};
use crate::models::{Banner, Category};

/// How long category and banner lists are served from memory.
const LOOKUP_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
enum CacheKey {
    Categories,
    ActiveBanners,
}

#[derive(Debug, Clone)]
enum CacheValue {
    Categories(Arc<Vec<Category>>),
    Banners(Arc<Vec<Banner>>),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    ai: AiAssistant,
    lookups: Cache<CacheKey, CacheValue>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns `AiError` if an API key is configured but the HTTP client
    /// can't be built from it.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, AiError> {
        let (client, per_minute) = match &config.ai {
            Some(ai) => (Some(LlmClient::new(ai)?), ai.requests_per_minute),
            None => (None, 0),
        };
        let ai = AiAssistant::new(client, FixedWindowLimiter::new(per_minute));

        let lookups = Cache::builder()
            .max_capacity(16)
            .time_to_live(LOOKUP_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                ai,
                lookups,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Tax, shipping and commission settings.
    #[must_use]
    pub fn commerce(&self) -> &CommerceConfig {
        &self.inner.config.commerce
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// The AI suggestion flows.
    #[must_use]
    pub fn ai(&self) -> &AiAssistant {
        &self.inner.ai
    }

    /// All categories, cached briefly.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the categories can't be loaded.
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, RepositoryError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.lookups.get(&CacheKey::Categories).await
        {
            return Ok(categories);
        }
        let categories = Arc::new(CategoryRepository::new(self.pool()).list().await?);
        self.inner
            .lookups
            .insert(CacheKey::Categories, CacheValue::Categories(categories.clone()))
            .await;
        Ok(categories)
    }

    /// Active banners, cached briefly.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the banners can't be loaded.
    pub async fn active_banners(&self) -> Result<Arc<Vec<Banner>>, RepositoryError> {
        if let Some(CacheValue::Banners(banners)) =
            self.inner.lookups.get(&CacheKey::ActiveBanners).await
        {
            return Ok(banners);
        }
        let banners = Arc::new(BannerRepository::new(self.pool()).list_active().await?);
        self.inner
            .lookups
            .insert(CacheKey::ActiveBanners, CacheValue::Banners(banners.clone()))
            .await;
        Ok(banners)
    }

    /// Drop the cached category list after an admin change.
    pub async fn invalidate_categories(&self) {
        self.inner.lookups.invalidate(&CacheKey::Categories).await;
    }

    /// Drop the cached banner list after an admin change.
    pub async fn invalidate_banners(&self) {
        self.inner.lookups.invalidate(&CacheKey::ActiveBanners).await;
    }
}
