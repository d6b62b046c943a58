//! Homepage banners.

use sqlx::PgPool;

use bazaar_core::BannerId;

use super::RepositoryError;
use crate::models::Banner;

const BANNER_COLUMNS: &str = "id, title, image_url, link_url, position, active, created_at";

/// Repository for banners.
pub struct BannerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BannerRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active banners in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Banner>, RepositoryError> {
        let banners = sqlx::query_as::<_, Banner>(&format!(
            "SELECT {BANNER_COLUMNS} FROM bazaar.banner WHERE active ORDER BY position, id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(banners)
    }

    /// Every banner in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Banner>, RepositoryError> {
        let banners = sqlx::query_as::<_, Banner>(&format!(
            "SELECT {BANNER_COLUMNS} FROM bazaar.banner ORDER BY position, id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(banners)
    }

    /// Create an active banner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        title: &str,
        image_url: &str,
        link_url: Option<&str>,
        position: i32,
    ) -> Result<Banner, RepositoryError> {
        let banner = sqlx::query_as::<_, Banner>(&format!(
            "INSERT INTO bazaar.banner (title, image_url, link_url, position) \
             VALUES ($1, $2, $3, $4) RETURNING {BANNER_COLUMNS}"
        ))
        .bind(title)
        .bind(image_url)
        .bind(link_url)
        .bind(position)
        .fetch_one(self.pool)
        .await?;

        Ok(banner)
    }

    /// Flip a banner between shown and hidden.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the banner doesn't exist.
    pub async fn toggle(&self, id: BannerId) -> Result<Banner, RepositoryError> {
        sqlx::query_as::<_, Banner>(&format!(
            "UPDATE bazaar.banner SET active = NOT active WHERE id = $1 RETURNING {BANNER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a banner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the banner doesn't exist.
    pub async fn delete(&self, id: BannerId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM bazaar.banner WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
