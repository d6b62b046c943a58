//! Account domain types.

use chrono::{DateTime, Utc};

use bazaar_core::{Email, Percent, Role, SalespersonId, UserId, VendorId, VendorStatus};

/// A marketplace account (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Sign-in email address.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Role deciding which areas the account may enter.
    pub role: Role,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A vendor's store profile.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VendorProfile {
    pub id: VendorId,
    /// Account that owns the store.
    pub user_id: UserId,
    pub store_name: String,
    /// URL segment of the public store page (`/stores/{slug}`).
    pub slug: String,
    pub description: String,
    /// Platform fee withheld from the vendor's sales.
    pub commission_rate: Percent,
    pub status: VendorStatus,
    pub created_at: DateTime<Utc>,
}

/// A salesperson's commission settings, joined with their account name.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SalespersonProfile {
    pub id: SalespersonId,
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    /// Share of each attributed order total.
    pub commission_rate: Percent,
    pub region: Option<String>,
    pub created_at: DateTime<Utc>,
}
