//! Vendor store profiles.

use sqlx::PgPool;

use bazaar_core::{Percent, UserId, VendorId, VendorStatus};

use super::RepositoryError;
use crate::models::VendorProfile;

const VENDOR_COLUMNS: &str =
    "id, user_id, store_name, slug, description, commission_rate, status, created_at";

/// Editable store fields.
#[derive(Debug, Clone)]
pub struct StoreDetails {
    pub store_name: String,
    pub slug: String,
    pub description: String,
}

/// Repository for vendor profiles.
pub struct VendorRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> VendorRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The store owned by an account, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<VendorProfile>, RepositoryError> {
        let vendor = sqlx::query_as::<_, VendorProfile>(&format!(
            "SELECT {VENDOR_COLUMNS} FROM bazaar.vendor WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(vendor)
    }

    /// A store by its public slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<VendorProfile>, RepositoryError> {
        let vendor = sqlx::query_as::<_, VendorProfile>(&format!(
            "SELECT {VENDOR_COLUMNS} FROM bazaar.vendor WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(vendor)
    }

    /// Create or update the store owned by `user_id`.
    ///
    /// New stores start `pending` with `default_commission`; updates keep the
    /// existing status and commission.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken by another store.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn upsert(
        &self,
        user_id: UserId,
        details: &StoreDetails,
        default_commission: Percent,
    ) -> Result<VendorProfile, RepositoryError> {
        sqlx::query_as::<_, VendorProfile>(&format!(
            "INSERT INTO bazaar.vendor (user_id, store_name, slug, description, commission_rate) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (user_id) DO UPDATE SET \
                 store_name = EXCLUDED.store_name, \
                 slug = EXCLUDED.slug, \
                 description = EXCLUDED.description \
             RETURNING {VENDOR_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&details.store_name)
        .bind(&details.slug)
        .bind(&details.description)
        .bind(default_commission)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique(e, "store slug already taken"))
    }

    /// All stores, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<VendorProfile>, RepositoryError> {
        let vendors = sqlx::query_as::<_, VendorProfile>(&format!(
            "SELECT {VENDOR_COLUMNS} FROM bazaar.vendor ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(vendors)
    }

    /// Approve or suspend a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_status(
        &self,
        id: VendorId,
        status: VendorStatus,
    ) -> Result<VendorProfile, RepositoryError> {
        sqlx::query_as::<_, VendorProfile>(&format!(
            "UPDATE bazaar.vendor SET status = $2 WHERE id = $1 RETURNING {VENDOR_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Change the platform fee withheld from a store's sales.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_commission(
        &self,
        id: VendorId,
        rate: Percent,
    ) -> Result<VendorProfile, RepositoryError> {
        sqlx::query_as::<_, VendorProfile>(&format!(
            "UPDATE bazaar.vendor SET commission_rate = $2 WHERE id = $1 \
             RETURNING {VENDOR_COLUMNS}"
        ))
        .bind(id)
        .bind(rate)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}
