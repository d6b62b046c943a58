//! Orders and order items.
//!
//! Placing an order and changing its status both run in a transaction so
//! that stock levels always match the orders that reserved them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bazaar_core::analytics::{ItemSale, SaleRecord};
use bazaar_core::{Money, OrderId, OrderStatus, ProductId, SalesChannel, UserId, VendorId};

use super::RepositoryError;
use crate::models::{NewOrder, Order, OrderItem, OrderWithItems};

const ORDER_COLUMNS: &str = "id, customer_id, salesperson_id, channel, status, subtotal, tax, \
                             shipping, total, customer_name, shipping_address, created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, order_id, product_id, vendor_id, product_name, unit_price, quantity, line_total";

/// Admin order list filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub channel: Option<SalesChannel>,
}

/// Whose sales to aggregate.
#[derive(Debug, Clone, Copy)]
pub enum SaleScope {
    /// Every order's total.
    Platform,
    /// One vendor's share of each order.
    Vendor(VendorId),
    /// Totals of orders attributed to one salesperson.
    Salesperson(UserId),
}

/// Repository for orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Write an order and its items, reserving stock for every line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if any product has too little stock;
    /// nothing is written in that case.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn place(&self, new: &NewOrder) -> Result<OrderWithItems, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for line in &new.lines {
            let quantity = quantity_to_db(line.quantity)?;
            let reserved = sqlx::query(
                r"
                UPDATE bazaar.product SET stock = stock - $2, updated_at = NOW()
                WHERE id = $1 AND stock >= $2
                ",
            )
            .bind(line.product_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;

            if reserved.rows_affected() == 0 {
                return Err(RepositoryError::Conflict(format!(
                    "not enough stock for {}",
                    line.product_name
                )));
            }
        }

        let order = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO bazaar.order \
                 (customer_id, salesperson_id, channel, status, subtotal, tax, shipping, total, \
                  customer_name, shipping_address) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(new.customer_id)
        .bind(new.salesperson_id)
        .bind(new.channel)
        .bind(new.status)
        .bind(new.totals.subtotal)
        .bind(new.totals.tax)
        .bind(new.totals.shipping)
        .bind(new.totals.total)
        .bind(&new.customer_name)
        .bind(new.shipping_address.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(new.lines.len());
        for line in &new.lines {
            let item = sqlx::query_as::<_, OrderItem>(&format!(
                "INSERT INTO bazaar.order_item \
                     (order_id, product_id, vendor_id, product_name, unit_price, quantity, line_total) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7) \
                 RETURNING {ITEM_COLUMNS}"
            ))
            .bind(order.id)
            .bind(line.product_id)
            .bind(line.vendor_id)
            .bind(&line.product_name)
            .bind(line.unit_price)
            .bind(quantity_to_db(line.quantity)?)
            .bind(line.line_total())
            .fetch_one(&mut *tx)
            .await?;
            items.push(item);
        }

        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            channel = %order.channel,
            total = %order.total,
            "order placed"
        );

        Ok(OrderWithItems { order, items })
    }

    /// An order with all of its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_items(
        &self,
        id: OrderId,
    ) -> Result<Option<OrderWithItems>, RepositoryError> {
        let Some(order) = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM bazaar.order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM bazaar.order_item WHERE order_id = $1 ORDER BY id"
        ))
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(OrderWithItems { order, items }))
    }

    /// Orders placed by a customer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_customer(&self, customer_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM bazaar.order WHERE customer_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Orders attributed to a salesperson, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_salesperson(
        &self,
        salesperson_id: UserId,
    ) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM bazaar.order WHERE salesperson_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(salesperson_id)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Orders containing a vendor's products, newest first. Each order carries
    /// only that vendor's items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_vendor(
        &self,
        vendor_id: VendorId,
    ) -> Result<Vec<OrderWithItems>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM bazaar.order o \
             WHERE EXISTS (SELECT 1 FROM bazaar.order_item i \
                           WHERE i.order_id = o.id AND i.vendor_id = $1) \
             ORDER BY created_at DESC"
        ))
        .bind(vendor_id)
        .fetch_all(self.pool)
        .await?;

        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM bazaar.order_item WHERE vendor_id = $1 ORDER BY id"
        ))
        .bind(vendor_id)
        .fetch_all(self.pool)
        .await?;

        Ok(attach_items(orders, items))
    }

    /// Every order, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self, filter: OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM bazaar.order \
             WHERE ($1::bazaar.order_status IS NULL OR status = $1) \
               AND ($2::bazaar.sales_channel IS NULL OR channel = $2) \
             ORDER BY created_at DESC"
        ))
        .bind(filter.status)
        .bind(filter.channel)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Move an order to `next`. Cancelling returns the items to stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Conflict` if the transition isn't allowed.
    pub async fn update_status(
        &self,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_scalar::<_, OrderStatus>(
            "SELECT status FROM bazaar.order WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if !current.can_transition_to(next) {
            return Err(RepositoryError::Conflict(format!(
                "cannot move order from {current} to {next}"
            )));
        }

        if next == OrderStatus::Cancelled {
            sqlx::query(
                r"
                UPDATE bazaar.product p SET stock = p.stock + i.quantity, updated_at = NOW()
                FROM bazaar.order_item i
                WHERE i.order_id = $1 AND i.product_id = p.id
                ",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE bazaar.order SET status = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(next)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(order_id = %id, from = %current, to = %next, "order status changed");
        Ok(order)
    }

    /// Non-cancelled sales in `scope`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sale_records(&self, scope: SaleScope) -> Result<Vec<SaleRecord>, RepositoryError> {
        let query = match scope {
            SaleScope::Platform => sqlx::query_as::<_, (DateTime<Utc>, Money)>(
                r"
                SELECT created_at, total FROM bazaar.order
                WHERE status <> 'cancelled'
                ORDER BY created_at
                ",
            ),
            SaleScope::Vendor(vendor_id) => sqlx::query_as::<_, (DateTime<Utc>, Money)>(
                r"
                SELECT o.created_at, SUM(i.line_total)
                FROM bazaar.order o
                JOIN bazaar.order_item i ON i.order_id = o.id
                WHERE i.vendor_id = $1 AND o.status <> 'cancelled'
                GROUP BY o.id, o.created_at
                ORDER BY o.created_at
                ",
            )
            .bind(vendor_id),
            SaleScope::Salesperson(user_id) => sqlx::query_as::<_, (DateTime<Utc>, Money)>(
                r"
                SELECT created_at, total FROM bazaar.order
                WHERE salesperson_id = $1 AND status <> 'cancelled'
                ORDER BY created_at
                ",
            )
            .bind(user_id),
        };

        let rows = query.fetch_all(self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|(created_at, amount)| SaleRecord { created_at, amount })
            .collect())
    }

    /// Units and revenue per product across non-cancelled orders, optionally
    /// for one vendor.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a quantity is out of range.
    pub async fn item_sales(
        &self,
        vendor_id: Option<VendorId>,
    ) -> Result<Vec<ItemSale>, RepositoryError> {
        let rows = sqlx::query_as::<_, (ProductId, String, i64, Money)>(
            r"
            SELECT i.product_id, MIN(i.product_name), SUM(i.quantity)::bigint, SUM(i.line_total)
            FROM bazaar.order_item i
            JOIN bazaar.order o ON o.id = i.order_id
            WHERE o.status <> 'cancelled' AND ($1::int IS NULL OR i.vendor_id = $1)
            GROUP BY i.product_id
            ",
        )
        .bind(vendor_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|(product_id, product_name, quantity, revenue)| {
                let quantity = u32::try_from(quantity).map_err(|_| {
                    RepositoryError::DataCorruption(format!("quantity out of range: {quantity}"))
                })?;
                Ok(ItemSale {
                    product_id,
                    product_name,
                    quantity,
                    revenue,
                })
            })
            .collect()
    }

    /// Number of orders per status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_status(&self) -> Result<Vec<(OrderStatus, i64)>, RepositoryError> {
        let rows = sqlx::query_as::<_, (OrderStatus, i64)>(
            "SELECT status, COUNT(*) FROM bazaar.order GROUP BY status ORDER BY status",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}

fn quantity_to_db(quantity: u32) -> Result<i32, RepositoryError> {
    i32::try_from(quantity)
        .map_err(|_| RepositoryError::Conflict(format!("quantity too large: {quantity}")))
}

/// Group items under their orders, keeping the orders' order.
fn attach_items(orders: Vec<Order>, items: Vec<OrderItem>) -> Vec<OrderWithItems> {
    let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
    for item in items {
        by_order.entry(item.order_id).or_default().push(item);
    }
    orders
        .into_iter()
        .map(|order| {
            let items = by_order.remove(&order.id).unwrap_or_default();
            OrderWithItems { order, items }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::OrderItemId;

    fn order(id: i32) -> Order {
        let now = Utc::now();
        Order {
            id: OrderId::new(id),
            customer_id: None,
            salesperson_id: None,
            channel: SalesChannel::Online,
            status: OrderStatus::Pending,
            subtotal: Money::ZERO,
            tax: Money::ZERO,
            shipping: Money::ZERO,
            total: Money::ZERO,
            customer_name: "Ada".to_owned(),
            shipping_address: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn item(id: i32, order_id: i32, vendor_id: i32, cents: u32) -> OrderItem {
        OrderItem {
            id: OrderItemId::new(id),
            order_id: OrderId::new(order_id),
            product_id: ProductId::new(id),
            vendor_id: VendorId::new(vendor_id),
            product_name: format!("Item {id}"),
            unit_price: Money::from_cents(cents),
            quantity: 1,
            line_total: Money::from_cents(cents),
        }
    }

    #[test]
    fn test_attach_items_keeps_order_sequence() {
        let grouped = attach_items(
            vec![order(2), order(1)],
            vec![item(1, 1, 7, 500), item(2, 2, 7, 250), item(3, 1, 7, 100)],
        );
        let ids: Vec<i32> = grouped.iter().map(|o| o.order.id.as_i32()).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(grouped.get(1).map(|o| o.items.len()), Some(2));
        assert_eq!(
            grouped.get(1).map(|o| o.vendor_subtotal(VendorId::new(7))),
            Some(Money::from_cents(600))
        );
    }

    #[test]
    fn test_quantity_to_db_rejects_overflow() {
        assert_eq!(quantity_to_db(3).ok(), Some(3));
        assert!(matches!(
            quantity_to_db(u32::MAX),
            Err(RepositoryError::Conflict(_))
        ));
    }

    mod postgres {
        use bazaar_core::pricing::Totals;

        use super::*;
        use crate::models::NewOrderLine;

        /// One approved vendor with two active products, returning their IDs.
        async fn seed(pool: &PgPool, stocks: [i32; 2]) -> (VendorId, [ProductId; 2]) {
            let user_id: UserId = sqlx::query_scalar(
                "INSERT INTO bazaar.user (email, name, role) \
                 VALUES ('shop@example.com', 'Shop', 'vendor') RETURNING id",
            )
            .fetch_one(pool)
            .await
            .expect("user");
            let vendor_id: VendorId = sqlx::query_scalar(
                "INSERT INTO bazaar.vendor (user_id, store_name, slug, commission_rate, status) \
                 VALUES ($1, 'Shop', 'shop', 10, 'approved') RETURNING id",
            )
            .bind(user_id)
            .fetch_one(pool)
            .await
            .expect("vendor");

            let mut ids = [ProductId::new(0); 2];
            for (n, (slot, stock)) in ids.iter_mut().zip(stocks).enumerate() {
                *slot = sqlx::query_scalar(
                    "INSERT INTO bazaar.product (vendor_id, name, slug, price, stock, status) \
                     VALUES ($1, $2, $3, 10, $4, 'active') RETURNING id",
                )
                .bind(vendor_id)
                .bind(format!("Widget {n}"))
                .bind(format!("widget-{n}"))
                .bind(stock)
                .fetch_one(pool)
                .await
                .expect("product");
            }
            (vendor_id, ids)
        }

        fn new_order(vendor_id: VendorId, lines: &[(ProductId, u32)]) -> NewOrder {
            NewOrder {
                customer_id: None,
                salesperson_id: None,
                channel: SalesChannel::Online,
                status: OrderStatus::Pending,
                customer_name: "Ada".to_owned(),
                shipping_address: Some("1 Main St".to_owned()),
                lines: lines
                    .iter()
                    .map(|&(product_id, quantity)| NewOrderLine {
                        product_id,
                        vendor_id,
                        product_name: format!("Product {product_id}"),
                        unit_price: Money::from_cents(1000),
                        quantity,
                    })
                    .collect(),
                totals: Totals::EMPTY,
            }
        }

        async fn stock(pool: &PgPool, id: ProductId) -> i32 {
            sqlx::query_scalar("SELECT stock FROM bazaar.product WHERE id = $1")
                .bind(id)
                .fetch_one(pool)
                .await
                .expect("stock")
        }

        async fn order_count(pool: &PgPool) -> i64 {
            sqlx::query_scalar("SELECT COUNT(*) FROM bazaar.order")
                .fetch_one(pool)
                .await
                .expect("count")
        }

        #[sqlx::test]
        #[ignore = "Requires PostgreSQL (set DATABASE_URL)"]
        async fn test_place_reserves_stock(pool: PgPool) {
            let (vendor_id, [a, b]) = seed(&pool, [5, 3]).await;

            let placed = OrderRepository::new(&pool)
                .place(&new_order(vendor_id, &[(a, 2), (b, 3)]))
                .await
                .expect("placed");

            assert_eq!(placed.items.len(), 2);
            assert_eq!(stock(&pool, a).await, 3);
            assert_eq!(stock(&pool, b).await, 0);
        }

        #[sqlx::test]
        #[ignore = "Requires PostgreSQL (set DATABASE_URL)"]
        async fn test_oversold_line_writes_nothing(pool: PgPool) {
            let (vendor_id, [a, b]) = seed(&pool, [5, 1]).await;

            let result = OrderRepository::new(&pool)
                .place(&new_order(vendor_id, &[(a, 2), (b, 2)]))
                .await;

            assert!(matches!(result, Err(RepositoryError::Conflict(_))));
            assert_eq!(stock(&pool, a).await, 5);
            assert_eq!(stock(&pool, b).await, 1);
            assert_eq!(order_count(&pool).await, 0);
        }

        #[sqlx::test]
        #[ignore = "Requires PostgreSQL (set DATABASE_URL)"]
        async fn test_cancel_restocks(pool: PgPool) {
            let (vendor_id, [a, b]) = seed(&pool, [5, 4]).await;
            let repo = OrderRepository::new(&pool);
            let placed = repo
                .place(&new_order(vendor_id, &[(a, 2), (b, 1)]))
                .await
                .expect("placed");

            let cancelled = repo
                .update_status(placed.order.id, OrderStatus::Cancelled)
                .await
                .expect("cancelled");

            assert_eq!(cancelled.status, OrderStatus::Cancelled);
            assert_eq!(stock(&pool, a).await, 5);
            assert_eq!(stock(&pool, b).await, 4);

            // Cancelled is terminal, so stock can't be returned twice.
            assert!(matches!(
                repo.update_status(placed.order.id, OrderStatus::Cancelled).await,
                Err(RepositoryError::Conflict(_))
            ));
            assert_eq!(stock(&pool, a).await, 5);
        }
    }
}
