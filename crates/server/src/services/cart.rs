//! Session-held shopping cart.
//!
//! The session stores only product IDs and quantities. Prices, names and
//! stock are loaded fresh every time the cart is shown or checked out.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_sessions::Session;

use bazaar_core::pricing::{self, PricedLine, Totals};
use bazaar_core::{Money, ProductId};

use crate::config::CommerceConfig;
use crate::db::{ProductRepository, RepositoryError};
use crate::models::{Product, session_keys};

/// One cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// The cart as stored in the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Load the cart from the session; missing means empty.
    ///
    /// # Errors
    ///
    /// Returns the session store error.
    pub async fn load(session: &Session) -> Result<Self, tower_sessions::session::Error> {
        Ok(session
            .get::<Self>(session_keys::CART)
            .await?
            .unwrap_or_default())
    }

    /// Write the cart back to the session.
    ///
    /// # Errors
    ///
    /// Returns the session store error.
    pub async fn save(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(session_keys::CART, self).await
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.lines.iter().map(|l| l.product_id).collect()
    }

    /// Add units of a product, merging with an existing line.
    pub fn add(&mut self, product_id: ProductId, quantity: u32) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = pricing::clamp_quantity(line.quantity.saturating_add(quantity));
        } else {
            self.lines.push(CartLine {
                product_id,
                quantity: pricing::clamp_quantity(quantity),
            });
        }
    }

    /// Set a line's quantity; zero removes it. Unknown products are ignored.
    pub fn update(&mut self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove(product_id);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = pricing::clamp_quantity(quantity);
        }
    }

    pub fn remove(&mut self, product_id: ProductId) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Drop lines for the given products.
    pub fn prune(&mut self, product_ids: &[ProductId]) {
        self.lines.retain(|l| !product_ids.contains(&l.product_id));
    }
}

/// A cart line joined with its current product.
#[derive(Debug, Clone)]
pub struct PricedCartLine {
    pub product: Product,
    pub quantity: u32,
    pub line_total: Money,
}

impl PricedCartLine {
    /// Whether the product has enough stock for this line.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.quantity <= self.product.available()
    }
}

/// A cart with current prices and totals.
#[derive(Debug, Clone)]
pub struct PricedCart {
    pub lines: Vec<PricedCartLine>,
    pub totals: Totals,
    /// Lines removed because the product is gone or no longer for sale.
    pub dropped: Vec<ProductId>,
    /// Spend needed to reach free shipping, if any.
    pub free_shipping_remaining: Option<Money>,
}

impl PricedCart {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Names of products without enough stock for their line.
    #[must_use]
    pub fn out_of_stock(&self) -> Vec<String> {
        self.lines
            .iter()
            .filter(|l| !l.in_stock())
            .map(|l| l.product.name.clone())
            .collect()
    }
}

/// Join cart lines with products and quote totals.
#[must_use]
pub fn price(cart: &Cart, products: Vec<Product>, commerce: &CommerceConfig) -> PricedCart {
    let mut by_id: HashMap<ProductId, Product> =
        products.into_iter().map(|p| (p.id, p)).collect();

    let mut lines = Vec::with_capacity(cart.lines.len());
    let mut dropped = Vec::new();
    for line in &cart.lines {
        match by_id.remove(&line.product_id) {
            Some(product) if product.is_on_sale() => {
                lines.push(PricedCartLine {
                    line_total: product.price * line.quantity,
                    quantity: line.quantity,
                    product,
                });
            }
            _ => dropped.push(line.product_id),
        }
    }

    let priced: Vec<PricedLine> = lines
        .iter()
        .map(|l| PricedLine::new(l.product.price, l.quantity))
        .collect();
    let totals = pricing::quote(&priced, commerce.tax_rate, &commerce.shipping);
    let free_shipping_remaining = if lines.is_empty() {
        None
    } else {
        commerce.shipping.remaining_for_free(totals.subtotal)
    };

    PricedCart {
        lines,
        totals,
        dropped,
        free_shipping_remaining,
    }
}

/// Load the cart's products and price it.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the product query fails.
pub async fn load_priced(
    pool: &PgPool,
    cart: &Cart,
    commerce: &CommerceConfig,
) -> Result<PricedCart, RepositoryError> {
    let products = ProductRepository::new(pool)
        .list_by_ids(&cart.product_ids())
        .await?;
    Ok(price(cart, products, commerce))
}

#[cfg(test)]
mod tests {
    use bazaar_core::{ProductStatus, VendorStatus};
    use bazaar_core::pricing::MAX_LINE_QUANTITY;

    use super::*;
    use crate::models::catalog::fixtures::product;

    fn pid(id: i32) -> ProductId {
        ProductId::new(id)
    }

    #[test]
    fn test_add_merges_and_clamps() {
        let mut cart = Cart::default();
        cart.add(pid(1), 2);
        cart.add(pid(2), 0);
        cart.add(pid(1), 3);
        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.item_count(), 6);

        cart.add(pid(1), 500);
        assert_eq!(cart.lines().first().map(|l| l.quantity), Some(MAX_LINE_QUANTITY));
    }

    #[test]
    fn test_update_zero_removes() {
        let mut cart = Cart::default();
        cart.add(pid(1), 2);
        cart.update(pid(1), 4);
        assert_eq!(cart.item_count(), 4);
        cart.update(pid(9), 4);
        assert_eq!(cart.lines().len(), 1);
        cart.update(pid(1), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::default();
        cart.add(pid(1), 1);
        cart.add(pid(2), 1);
        cart.remove(pid(1));
        assert_eq!(cart.product_ids(), vec![pid(2)]);
        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_price_drops_missing_and_inactive() {
        let mut cart = Cart::default();
        cart.add(pid(1), 2);
        cart.add(pid(2), 1);
        cart.add(pid(3), 1);

        let mut archived = product(2, "5.00", 10);
        archived.status = ProductStatus::Archived;
        let priced = price(
            &cart,
            vec![product(1, "10.00", 10), archived],
            &CommerceConfig::default(),
        );

        assert_eq!(priced.lines.len(), 1);
        assert_eq!(priced.dropped, vec![pid(2), pid(3)]);
        assert_eq!(priced.totals.subtotal, Money::from_cents(2000));
        // 8% tax, $5 shipping under the $50 threshold.
        assert_eq!(priced.totals.total, Money::from_cents(2660));
        assert_eq!(priced.free_shipping_remaining, Some(Money::from_cents(3000)));
    }

    #[test]
    fn test_price_drops_lines_of_suspended_vendors() {
        let mut cart = Cart::default();
        cart.add(pid(1), 1);
        cart.add(pid(2), 1);

        let mut suspended = product(2, "5.00", 10);
        suspended.vendor_status = VendorStatus::Suspended;
        let priced = price(
            &cart,
            vec![product(1, "10.00", 10), suspended],
            &CommerceConfig::default(),
        );

        assert_eq!(priced.lines.len(), 1);
        assert_eq!(priced.dropped, vec![pid(2)]);
        assert_eq!(priced.totals.subtotal, Money::from_cents(1000));
    }

    #[test]
    fn test_out_of_stock_lines_are_reported() {
        let mut cart = Cart::default();
        cart.add(pid(1), 3);
        let priced = price(&cart, vec![product(1, "1.00", 2)], &CommerceConfig::default());
        assert_eq!(priced.out_of_stock(), vec!["Product 1".to_owned()]);
    }

    #[test]
    fn test_empty_cart_has_no_free_shipping_hint() {
        let priced = price(&Cart::default(), Vec::new(), &CommerceConfig::default());
        assert!(priced.is_empty());
        assert_eq!(priced.free_shipping_remaining, None);
        assert_eq!(priced.totals, Totals::EMPTY);
    }
}
