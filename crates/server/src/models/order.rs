//! Order domain types.

use chrono::{DateTime, Utc};

use bazaar_core::pricing::Totals;
use bazaar_core::{
    Money, OrderId, OrderItemId, OrderStatus, ProductId, SalesChannel, UserId, VendorId,
};

/// An order header.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    /// Signed-in buyer; `None` for walk-in POS sales.
    pub customer_id: Option<UserId>,
    /// Salesperson credited with the sale.
    pub salesperson_id: Option<UserId>,
    pub channel: SalesChannel,
    pub status: OrderStatus,
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total: Money,
    pub customer_name: String,
    pub shipping_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of an order. Name and price are copied at purchase time.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub vendor_id: VendorId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: i32,
    pub line_total: Money,
}

/// An order with its lines.
#[derive(Debug, Clone)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderWithItems {
    /// Sum of the lines belonging to one vendor.
    #[must_use]
    pub fn vendor_subtotal(&self, vendor_id: VendorId) -> Money {
        self.items
            .iter()
            .filter(|i| i.vendor_id == vendor_id)
            .map(|i| i.line_total)
            .sum()
    }
}

/// A line about to be written as part of a new order.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub vendor_id: VendorId,
    pub product_name: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl NewOrderLine {
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// Everything needed to place an order in one transaction.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: Option<UserId>,
    pub salesperson_id: Option<UserId>,
    pub channel: SalesChannel,
    pub status: OrderStatus,
    pub customer_name: String,
    pub shipping_address: Option<String>,
    pub lines: Vec<NewOrderLine>,
    pub totals: Totals,
}
