//! In-store sales entered at the point of sale.
//!
//! A POS sale is paid on the spot, so it is written as `delivered`, carries
//! no shipping and is attributed to the salesperson who entered it.

use std::collections::HashMap;

use serde::Deserialize;
use sqlx::PgPool;

use bazaar_core::pricing::{self, PricedLine, ShippingPolicy};
use bazaar_core::{OrderStatus, Percent, ProductId, SalesChannel};

use super::checkout::CheckoutError;
use crate::db::{OrderRepository, ProductRepository};
use crate::models::{CurrentUser, NewOrder, NewOrderLine, OrderWithItems, Product};

/// Name recorded when the buyer doesn't give one.
pub const WALK_IN_CUSTOMER: &str = "Walk-in customer";

/// One product scanned at the till.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PosEntry {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Build a POS order from till entries. Repeated products are merged and
/// zero quantities ignored.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` without entries,
/// `CheckoutError::UnknownProduct` for IDs not found or not on sale, and
/// `CheckoutError::OutOfStock` when stock is short.
pub fn build_pos_order(
    salesperson: &CurrentUser,
    customer_name: &str,
    entries: &[PosEntry],
    products: Vec<Product>,
    tax_rate: Percent,
) -> Result<NewOrder, CheckoutError> {
    let mut merged: Vec<(ProductId, u32)> = Vec::new();
    for entry in entries.iter().filter(|e| e.quantity > 0) {
        match merged.iter_mut().find(|(id, _)| *id == entry.product_id) {
            Some((_, quantity)) => *quantity = quantity.saturating_add(entry.quantity),
            None => merged.push((entry.product_id, entry.quantity)),
        }
    }
    if merged.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let by_id: HashMap<ProductId, Product> = products.into_iter().map(|p| (p.id, p)).collect();
    let mut lines = Vec::with_capacity(merged.len());
    let mut short = Vec::new();
    for (product_id, quantity) in merged {
        let product = by_id
            .get(&product_id)
            .filter(|p| p.is_on_sale())
            .ok_or(CheckoutError::UnknownProduct(product_id))?;
        if quantity > product.available() {
            short.push(product.name.clone());
        }
        lines.push(NewOrderLine {
            product_id,
            vendor_id: product.vendor_id,
            product_name: product.name.clone(),
            unit_price: product.price,
            quantity,
        });
    }
    if !short.is_empty() {
        return Err(CheckoutError::OutOfStock(short));
    }

    let priced: Vec<PricedLine> = lines
        .iter()
        .map(|l| PricedLine::new(l.unit_price, l.quantity))
        .collect();
    let totals = pricing::quote(&priced, tax_rate, &ShippingPolicy::FREE);

    let customer_name = match customer_name.trim() {
        "" => WALK_IN_CUSTOMER.to_owned(),
        name => name.to_owned(),
    };

    Ok(NewOrder {
        customer_id: None,
        salesperson_id: Some(salesperson.id),
        channel: SalesChannel::Pos,
        status: OrderStatus::Delivered,
        customer_name,
        shipping_address: None,
        lines,
        totals,
    })
}

/// Load the entered products and record the sale.
///
/// # Errors
///
/// See [`build_pos_order`]; database failures are `CheckoutError::Repository`.
pub async fn record_sale(
    pool: &PgPool,
    tax_rate: Percent,
    salesperson: &CurrentUser,
    customer_name: &str,
    entries: &[PosEntry],
) -> Result<OrderWithItems, CheckoutError> {
    let ids: Vec<ProductId> = entries.iter().map(|e| e.product_id).collect();
    let products = ProductRepository::new(pool).list_by_ids(&ids).await?;
    let order = build_pos_order(salesperson, customer_name, entries, products, tax_rate)?;
    Ok(OrderRepository::new(pool).place(&order).await?)
}

#[cfg(test)]
mod tests {
    use bazaar_core::{Email, Money, Role, UserId, VendorStatus};

    use super::*;
    use crate::models::catalog::fixtures::product;

    fn clerk() -> CurrentUser {
        CurrentUser {
            id: UserId::new(9),
            email: Email::parse("sam@example.com").expect("email"),
            name: "Sam".to_owned(),
            role: Role::Salesperson,
        }
    }

    fn entry(id: i32, quantity: u32) -> PosEntry {
        PosEntry {
            product_id: ProductId::new(id),
            quantity,
        }
    }

    #[test]
    fn test_pos_order_is_delivered_and_attributed() {
        let order = build_pos_order(
            &clerk(),
            "",
            &[entry(1, 1), entry(2, 0), entry(1, 2)],
            vec![product(1, "10.00", 5)],
            Percent::whole(10),
        )
        .expect("valid");

        assert_eq!(order.status, OrderStatus::Delivered);
        assert_eq!(order.channel, SalesChannel::Pos);
        assert_eq!(order.salesperson_id, Some(UserId::new(9)));
        assert_eq!(order.customer_id, None);
        assert_eq!(order.customer_name, WALK_IN_CUSTOMER);
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines.first().map(|l| l.quantity), Some(3));
        assert_eq!(order.totals.shipping, Money::ZERO);
        assert_eq!(order.totals.total, Money::from_cents(3300));
    }

    #[test]
    fn test_pos_rejects_bad_entries() {
        assert!(matches!(
            build_pos_order(&clerk(), "", &[], Vec::new(), Percent::ZERO),
            Err(CheckoutError::EmptyCart)
        ));
        assert!(matches!(
            build_pos_order(&clerk(), "", &[entry(4, 1)], Vec::new(), Percent::ZERO),
            Err(CheckoutError::UnknownProduct(_))
        ));
        assert!(matches!(
            build_pos_order(
                &clerk(),
                "Bo",
                &[entry(1, 6)],
                vec![product(1, "1.00", 5)],
                Percent::ZERO
            ),
            Err(CheckoutError::OutOfStock(_))
        ));
    }

    #[test]
    fn test_pos_rejects_suspended_vendor_products() {
        let mut suspended = product(1, "10.00", 5);
        suspended.vendor_status = VendorStatus::Suspended;
        assert!(matches!(
            build_pos_order(&clerk(), "", &[entry(1, 1)], vec![suspended], Percent::ZERO),
            Err(CheckoutError::UnknownProduct(id)) if id == ProductId::new(1)
        ));
    }
}
