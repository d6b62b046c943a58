//! Product reviews.

use sqlx::PgPool;

use bazaar_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::ProductReview;

/// Repository for product reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reviews of a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductReview>, RepositoryError> {
        let reviews = sqlx::query_as::<_, ProductReview>(
            r"
            SELECT r.id, r.product_id, r.user_id, u.name AS author_name,
                   r.rating, r.comment, r.created_at
            FROM bazaar.product_review r
            JOIN bazaar.user u ON u.id = r.user_id
            WHERE r.product_id = $1
            ORDER BY r.created_at DESC
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(reviews)
    }

    /// Add a review. Each account may review a product once.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already reviewed the product.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn add(
        &self,
        product_id: ProductId,
        user_id: UserId,
        rating: i16,
        comment: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO bazaar.product_review (product_id, user_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(product_id)
        .bind(user_id)
        .bind(rating)
        .bind(comment)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::unique(e, "you have already reviewed this product"))?;

        Ok(())
    }

    /// Mean rating and review count; `None` when there are no reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn average_rating(
        &self,
        product_id: ProductId,
    ) -> Result<Option<(f64, i64)>, RepositoryError> {
        let (average, count) = sqlx::query_as::<_, (Option<f64>, i64)>(
            r"
            SELECT AVG(rating)::float8, COUNT(*)
            FROM bazaar.product_review
            WHERE product_id = $1
            ",
        )
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;

        Ok(average.map(|avg| (avg, count)))
    }
}
