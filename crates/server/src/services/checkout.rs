//! Turning a priced cart into an order.

use sqlx::PgPool;
use thiserror::Error;

use bazaar_core::{OrderStatus, SalesChannel};

use super::cart::PricedCart;
use crate::db::{OrderRepository, RepositoryError};
use crate::models::{CurrentUser, NewOrder, NewOrderLine, OrderWithItems};

/// Why an order could not be placed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("your cart is empty")]
    EmptyCart,

    #[error("not enough stock for: {}", .0.join(", "))]
    OutOfStock(Vec<String>),

    #[error("some products are no longer available")]
    Unavailable,

    #[error("a shipping address is required")]
    MissingAddress,

    #[error("unknown product: {0}")]
    UnknownProduct(bazaar_core::ProductId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Shipping details entered on the checkout form.
#[derive(Debug, Clone)]
pub struct ShippingDetails {
    pub name: String,
    pub address: String,
}

/// Validate a priced cart and build the order to write.
///
/// # Errors
///
/// Returns `CheckoutError` when the cart is empty, lines were dropped since
/// the customer last saw it, stock is short, or the address is blank.
pub fn build_online_order(
    customer: &CurrentUser,
    cart: &PricedCart,
    shipping: &ShippingDetails,
) -> Result<NewOrder, CheckoutError> {
    if !cart.dropped.is_empty() {
        return Err(CheckoutError::Unavailable);
    }
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    let short = cart.out_of_stock();
    if !short.is_empty() {
        return Err(CheckoutError::OutOfStock(short));
    }
    let address = shipping.address.trim();
    if address.is_empty() {
        return Err(CheckoutError::MissingAddress);
    }
    let name = match shipping.name.trim() {
        "" => customer.name.clone(),
        name => name.to_owned(),
    };

    let lines = cart
        .lines
        .iter()
        .map(|l| NewOrderLine {
            product_id: l.product.id,
            vendor_id: l.product.vendor_id,
            product_name: l.product.name.clone(),
            unit_price: l.product.price,
            quantity: l.quantity,
        })
        .collect();

    Ok(NewOrder {
        customer_id: Some(customer.id),
        salesperson_id: None,
        channel: SalesChannel::Online,
        status: OrderStatus::Pending,
        customer_name: name,
        shipping_address: Some(address.to_owned()),
        lines,
        totals: cart.totals,
    })
}

/// Place an online order for a priced cart.
///
/// # Errors
///
/// Returns the validation error from [`build_online_order`], or
/// `CheckoutError::Repository` when the write fails (including a stock
/// race, reported as `RepositoryError::Conflict`).
pub async fn place_online_order(
    pool: &PgPool,
    customer: &CurrentUser,
    cart: &PricedCart,
    shipping: &ShippingDetails,
) -> Result<OrderWithItems, CheckoutError> {
    let order = build_online_order(customer, cart, shipping)?;
    Ok(OrderRepository::new(pool).place(&order).await?)
}

#[cfg(test)]
mod tests {
    use bazaar_core::{Email, Money, ProductId, Role, UserId};

    use super::*;
    use crate::config::CommerceConfig;
    use crate::models::catalog::fixtures::product;
    use crate::services::cart::{Cart, price};

    fn customer() -> CurrentUser {
        CurrentUser {
            id: UserId::new(5),
            email: Email::parse("ada@example.com").expect("email"),
            name: "Ada".to_owned(),
            role: Role::Customer,
        }
    }

    fn shipping(address: &str) -> ShippingDetails {
        ShippingDetails {
            name: String::new(),
            address: address.to_owned(),
        }
    }

    fn priced(stock: i32, qty: u32) -> PricedCart {
        let mut cart = Cart::default();
        cart.add(ProductId::new(1), qty);
        price(&cart, vec![product(1, "30.00", stock)], &CommerceConfig::default())
    }

    #[test]
    fn test_builds_pending_online_order() {
        let order = build_online_order(&customer(), &priced(5, 2), &shipping(" 1 Main St "))
            .expect("valid");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.channel, SalesChannel::Online);
        assert_eq!(order.customer_id, Some(UserId::new(5)));
        assert_eq!(order.customer_name, "Ada");
        assert_eq!(order.shipping_address.as_deref(), Some("1 Main St"));
        assert_eq!(order.lines.len(), 1);
        // Over the free shipping threshold.
        assert_eq!(order.totals.shipping, Money::ZERO);
        assert_eq!(order.totals.total, Money::from_cents(6480));
    }

    #[test]
    fn test_rejects_invalid_carts() {
        let empty = price(&Cart::default(), Vec::new(), &CommerceConfig::default());
        assert!(matches!(
            build_online_order(&customer(), &empty, &shipping("x")),
            Err(CheckoutError::EmptyCart)
        ));
        assert!(matches!(
            build_online_order(&customer(), &priced(1, 2), &shipping("x")),
            Err(CheckoutError::OutOfStock(_))
        ));
        assert!(matches!(
            build_online_order(&customer(), &priced(5, 1), &shipping("  ")),
            Err(CheckoutError::MissingAddress)
        ));

        let mut cart = Cart::default();
        cart.add(ProductId::new(2), 1);
        let gone = price(&cart, Vec::new(), &CommerceConfig::default());
        assert!(matches!(
            build_online_order(&customer(), &gone, &shipping("x")),
            Err(CheckoutError::Unavailable)
        ));
    }
}
