//! Product catalog queries.

use sqlx::{PgPool, Postgres, QueryBuilder};

use bazaar_core::{CategoryId, Money, ProductId, ProductStatus, VendorId};

use super::RepositoryError;
use crate::models::{Product, ProductInput};

const PRODUCT_SELECT: &str = r"
    SELECT p.id, p.vendor_id, v.store_name AS vendor_name, v.slug AS vendor_slug,
           v.status AS vendor_status,
           p.category_id, c.name AS category_name,
           p.name, p.slug, p.description, p.price, p.compare_at_price, p.stock,
           p.image_url, p.status, p.tags, p.created_at, p.updated_at
    FROM bazaar.product p
    JOIN bazaar.vendor v ON v.id = p.vendor_id
    LEFT JOIN bazaar.category c ON c.id = p.category_id
";

/// Storefront catalog filter.
#[derive(Debug, Clone, Default)]
pub struct ProductQuery {
    pub category_id: Option<CategoryId>,
    pub vendor_id: Option<VendorId>,
    /// Case-insensitive match against name, description and tags.
    pub search: Option<String>,
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
}

impl ProductQuery {
    pub const DEFAULT_PER_PAGE: u32 = 24;

    fn limit(&self) -> i64 {
        i64::from(if self.per_page == 0 {
            Self::DEFAULT_PER_PAGE
        } else {
            self.per_page
        })
    }

    fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * self.limit()
    }

    fn push_filters(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE p.status = 'active' AND v.status = 'approved'");
        if let Some(category_id) = self.category_id {
            qb.push(" AND p.category_id = ").push_bind(category_id);
        }
        if let Some(vendor_id) = self.vendor_id {
            qb.push(" AND p.vendor_id = ").push_bind(vendor_id);
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", escape_like(search));
            qb.push(" AND (p.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR p.description ILIKE ")
                .push_bind(pattern)
                .push(" OR ")
                .push_bind(search.to_lowercase())
                .push(" = ANY(p.tags))");
        }
    }
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

/// Repository for products.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Listed products matching `query`, newest first, with the total match count.
    ///
    /// Only active products of approved vendors are listed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(
        &self,
        query: &ProductQuery,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let mut count = QueryBuilder::new(
            "SELECT COUNT(*) FROM bazaar.product p JOIN bazaar.vendor v ON v.id = p.vendor_id",
        );
        query.push_filters(&mut count);
        let total = count.build_query_scalar::<i64>().fetch_one(self.pool).await?;

        let mut select = QueryBuilder::new(PRODUCT_SELECT);
        query.push_filters(&mut select);
        select
            .push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
            .push_bind(query.limit())
            .push(" OFFSET ")
            .push_bind(query.offset());
        let products = select.build_query_as::<Product>().fetch_all(self.pool).await?;

        Ok((products, total))
    }

    /// A product by slug, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!("{PRODUCT_SELECT} WHERE p.slug = $1"))
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;

        Ok(product)
    }

    /// A product by ID, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(product)
    }

    /// Products with the given IDs, in no particular order. Missing IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i32> = ids.iter().copied().map(ProductId::as_i32).collect();
        let products =
            sqlx::query_as::<_, Product>(&format!("{PRODUCT_SELECT} WHERE p.id = ANY($1)"))
                .bind(raw)
                .fetch_all(self.pool)
                .await?;

        Ok(products)
    }

    /// Every product of one vendor, any status, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_vendor(&self, vendor_id: VendorId) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} WHERE p.vendor_id = $1 ORDER BY p.created_at DESC"
        ))
        .bind(vendor_id)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Every product, optionally of one status, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(
        &self,
        status: Option<ProductStatus>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} WHERE $1::bazaar.product_status IS NULL OR p.status = $1 \
             ORDER BY p.created_at DESC"
        ))
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Prices of other listed products in a category, for price suggestions.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn comparable_prices(
        &self,
        category_id: CategoryId,
        exclude: Option<ProductId>,
        limit: i64,
    ) -> Result<Vec<Money>, RepositoryError> {
        let prices = sqlx::query_scalar::<_, Money>(
            r"
            SELECT price FROM bazaar.product
            WHERE category_id = $1 AND status = 'active'
              AND ($2::int IS NULL OR id <> $2)
            ORDER BY created_at DESC
            LIMIT $3
            ",
        )
        .bind(category_id)
        .bind(exclude)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(prices)
    }

    /// Create a product for a vendor.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        vendor_id: VendorId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let id = sqlx::query_scalar::<_, ProductId>(
            r"
            INSERT INTO bazaar.product
                (vendor_id, category_id, name, slug, description, price,
                 compare_at_price, stock, image_url, status, tags)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            ",
        )
        .bind(vendor_id)
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.compare_at_price)
        .bind(input.stock)
        .bind(input.image_url.as_deref())
        .bind(input.status)
        .bind(&input.tags)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique(e, "product slug already exists"))?;

        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Update a product owned by `vendor_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the vendor has no such product.
    /// Returns `RepositoryError::Conflict` if the new slug is taken.
    pub async fn update(
        &self,
        vendor_id: VendorId,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE bazaar.product SET
                category_id = $3, name = $4, slug = $5, description = $6, price = $7,
                compare_at_price = $8, stock = $9, image_url = $10, status = $11,
                tags = $12, updated_at = NOW()
            WHERE id = $1 AND vendor_id = $2
            ",
        )
        .bind(id)
        .bind(vendor_id)
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.compare_at_price)
        .bind(input.stock)
        .bind(input.image_url.as_deref())
        .bind(input.status)
        .bind(&input.tags)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::unique(e, "product slug already exists"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product owned by `vendor_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the vendor has no such product.
    /// Returns `RepositoryError::Conflict` if the product appears on an order.
    pub async fn delete(&self, vendor_id: VendorId, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM bazaar.product WHERE id = $1 AND vendor_id = $2")
            .bind(id)
            .bind(vendor_id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::Conflict(
                        "product has orders; archive it instead".to_owned(),
                    );
                }
                RepositoryError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Set a product's status (admin moderation).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn set_status(
        &self,
        id: ProductId,
        status: ProductStatus,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE bazaar.product SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(status)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Number of products per status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_status(&self) -> Result<Vec<(ProductStatus, i64)>, RepositoryError> {
        let rows = sqlx::query_as::<_, (ProductStatus, i64)>(
            "SELECT status, COUNT(*) FROM bazaar.product GROUP BY status ORDER BY status",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let q = ProductQuery::default();
        assert_eq!(q.limit(), 24);
        assert_eq!(q.offset(), 0);

        let q = ProductQuery {
            page: 3,
            per_page: 10,
            ..ProductQuery::default()
        };
        assert_eq!(q.offset(), 20);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn test_filters_bind_search_terms() {
        let q = ProductQuery {
            category_id: Some(CategoryId::new(4)),
            search: Some("  Mug ".to_owned()),
            ..ProductQuery::default()
        };
        let mut qb = QueryBuilder::new("SELECT 1 FROM bazaar.product p");
        q.push_filters(&mut qb);
        let sql = qb.sql();
        assert!(sql.contains("p.status = 'active'"));
        assert!(sql.contains("p.category_id = $1"));
        assert!(sql.contains("p.name ILIKE $2"));
        assert!(sql.contains("$4 = ANY(p.tags)"));
        assert!(!sql.contains("p.vendor_id"));
    }

    #[sqlx::test]
    #[ignore = "Requires PostgreSQL (set DATABASE_URL)"]
    async fn test_list_by_ids_carries_vendor_status(pool: PgPool) {
        let user_id: i32 = sqlx::query_scalar(
            "INSERT INTO bazaar.user (email, name, role) \
             VALUES ('shop@example.com', 'Shop', 'vendor') RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .expect("user");
        let vendor_id: VendorId = sqlx::query_scalar(
            "INSERT INTO bazaar.vendor (user_id, store_name, slug, commission_rate, status) \
             VALUES ($1, 'Shop', 'shop', 10, 'suspended') RETURNING id",
        )
        .bind(user_id)
        .fetch_one(&pool)
        .await
        .expect("vendor");
        let product_id: ProductId = sqlx::query_scalar(
            "INSERT INTO bazaar.product (vendor_id, name, slug, price, stock, status) \
             VALUES ($1, 'Lamp', 'lamp', 20, 4, 'active') RETURNING id",
        )
        .bind(vendor_id)
        .fetch_one(&pool)
        .await
        .expect("product");

        let products = ProductRepository::new(&pool)
            .list_by_ids(&[product_id, ProductId::new(product_id.as_i32() + 100)])
            .await
            .expect("query");

        assert_eq!(products.len(), 1);
        let lamp = products.first().expect("lamp");
        assert_eq!(lamp.vendor_status, bazaar_core::VendorStatus::Suspended);
        assert!(!lamp.is_on_sale());
    }
}
