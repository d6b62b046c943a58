//! Salesperson commission settings.

use sqlx::PgPool;

use bazaar_core::{Percent, UserId};

use super::RepositoryError;
use crate::models::SalespersonProfile;

const SALESPERSON_SELECT: &str = r"
    SELECT s.id, s.user_id, u.name, u.email, s.commission_rate, s.region, s.created_at
    FROM bazaar.salesperson s
    JOIN bazaar.user u ON u.id = s.user_id
";

/// Repository for salesperson profiles.
pub struct SalespersonRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SalespersonRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The profile of an account, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<SalespersonProfile>, RepositoryError> {
        let profile = sqlx::query_as::<_, SalespersonProfile>(&format!(
            "{SALESPERSON_SELECT} WHERE s.user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(profile)
    }

    /// All salespeople, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<SalespersonProfile>, RepositoryError> {
        let profiles = sqlx::query_as::<_, SalespersonProfile>(&format!(
            "{SALESPERSON_SELECT} ORDER BY u.name"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(profiles)
    }

    /// Create or update the profile of `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn upsert(
        &self,
        user_id: UserId,
        commission_rate: Percent,
        region: Option<&str>,
    ) -> Result<SalespersonProfile, RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO bazaar.salesperson (user_id, commission_rate, region)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET
                commission_rate = EXCLUDED.commission_rate,
                region = EXCLUDED.region
            ",
        )
        .bind(user_id)
        .bind(commission_rate)
        .bind(region)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        self.get_by_user(user_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}
