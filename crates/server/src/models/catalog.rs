//! Catalog domain types: categories, products, reviews and banners.

use chrono::{DateTime, Utc};

use bazaar_core::{
    BannerId, CategoryId, Money, ProductId, ProductStatus, ReviewId, UserId, VendorId,
    VendorStatus,
};

/// A product category.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

/// A product listed by a vendor, joined with its store and category names.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub vendor_id: VendorId,
    pub vendor_name: String,
    pub vendor_slug: String,
    pub vendor_status: VendorStatus,
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Money,
    /// Original price shown struck through when higher than `price`.
    pub compare_at_price: Option<Money>,
    pub stock: i32,
    pub image_url: Option<String>,
    pub status: ProductStatus,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether at least one unit is available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// Units available, as an unsigned count.
    #[must_use]
    pub fn available(&self) -> u32 {
        u32::try_from(self.stock).unwrap_or(0)
    }

    /// Active and listed by a store that may sell, regardless of stock.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.status == ProductStatus::Active && self.vendor_status.can_sell()
    }

    /// Whether customers can currently buy this product.
    #[must_use]
    pub fn is_purchasable(&self) -> bool {
        self.is_on_sale() && self.in_stock()
    }

    /// The struck-through price, if it is actually a discount.
    #[must_use]
    pub fn discounted_from(&self) -> Option<Money> {
        self.compare_at_price.filter(|c| *c > self.price)
    }
}

/// Fields a vendor edits on a product.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Money,
    pub compare_at_price: Option<Money>,
    pub stock: i32,
    pub image_url: Option<String>,
    pub status: ProductStatus,
    pub tags: Vec<String>,
}

/// A customer review with the author's display name.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductReview {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub user_id: UserId,
    pub author_name: String,
    /// 1 to 5 stars.
    pub rating: i16,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// A homepage promotional banner.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    pub image_url: String,
    pub link_url: Option<String>,
    /// Sort order, lowest first.
    pub position: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// An active product with sensible defaults for tests.
    pub fn product(id: i32, price: &str, stock: i32) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(id),
            vendor_id: VendorId::new(1),
            vendor_name: "Acme Goods".to_string(),
            vendor_slug: "acme-goods".to_string(),
            vendor_status: VendorStatus::Approved,
            category_id: None,
            category_name: None,
            name: format!("Product {id}"),
            slug: format!("product-{id}"),
            description: String::new(),
            price: price.parse().unwrap_or_default(),
            compare_at_price: None,
            stock,
            image_url: None,
            status: ProductStatus::Active,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::product;
    use super::*;

    #[test]
    fn test_purchasable_requires_active_and_stock() {
        let mut p = product(1, "9.99", 3);
        assert!(p.is_purchasable());

        p.stock = 0;
        assert!(!p.is_purchasable());

        p.stock = 3;
        p.status = ProductStatus::Draft;
        assert!(!p.is_purchasable());
    }

    #[test]
    fn test_suspended_vendor_products_are_off_sale() {
        let mut p = product(1, "9.99", 3);
        p.vendor_status = VendorStatus::Suspended;
        assert!(!p.is_on_sale());
        assert!(!p.is_purchasable());

        p.vendor_status = VendorStatus::Pending;
        assert!(!p.is_on_sale());
    }

    #[test]
    fn test_discounted_from_only_when_higher() {
        let mut p = product(1, "10.00", 1);
        p.compare_at_price = Some(Money::from_cents(800));
        assert_eq!(p.discounted_from(), None);
        p.compare_at_price = Some(Money::from_cents(1500));
        assert_eq!(p.discounted_from(), Some(Money::from_cents(1500)));
    }

    #[test]
    fn test_available_never_negative() {
        assert_eq!(product(1, "1.00", -2).available(), 0);
        assert_eq!(product(1, "1.00", 7).available(), 7);
    }
}
