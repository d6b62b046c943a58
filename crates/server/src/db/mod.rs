//! Database operations for the marketplace `PostgreSQL` schema.
//!
//! # Schema: `bazaar`
//!
//! ## Tables
//!
//! - `user` / `user_password` - Accounts and their argon2 password hashes
//! - `vendor` - Vendor store profiles (one per vendor account)
//! - `salesperson` - Salesperson commission settings (one per account)
//! - `category`, `product`, `product_review` - Catalog
//! - `order`, `order_item` - Online and point-of-sale orders
//! - `banner` - Homepage banners
//!
//! Sessions live in `tower_sessions.session`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p bazaar-cli -- migrate
//! ```

pub mod banners;
pub mod categories;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod salespeople;
pub mod users;
pub mod vendors;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use banners::BannerRepository;
pub use categories::CategoryRepository;
pub use orders::{OrderFilter, OrderRepository, SaleScope};
pub use products::{ProductQuery, ProductRepository};
pub use reviews::ReviewRepository;
pub use salespeople::SalespersonRepository;
pub use users::UserRepository;
pub use vendors::{StoreDetails, VendorRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email, insufficient stock).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
    pub(crate) fn unique(e: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message.to_owned());
        }
        Self::Database(e)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
