//! Revenue aggregation for the vendor, salesperson and admin dashboards.
//!
//! Inputs are rows the caller already fetched; nothing here does I/O.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::pricing;
use crate::types::{Money, Percent, ProductId};

/// One sale: an order total, or a vendor's share of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleRecord {
    pub created_at: DateTime<Utc>,
    pub amount: Money,
}

/// Revenue for one calendar month (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthBucket {
    pub year: i32,
    pub month: u32,
    pub order_count: u32,
    pub revenue: Money,
}

impl MonthBucket {
    const fn empty(year: i32, month: u32) -> Self {
        Self {
            year,
            month,
            order_count: 0,
            revenue: Money::ZERO,
        }
    }

    /// Short label such as `Mar 2026`.
    #[must_use]
    pub fn label(&self) -> String {
        const NAMES: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        let name = usize::try_from(self.month.saturating_sub(1))
            .ok()
            .and_then(|i| NAMES.get(i))
            .copied()
            .unwrap_or("???");
        format!("{name} {}", self.year)
    }
}

/// Σ amount.
#[must_use]
pub fn total_revenue(records: &[SaleRecord]) -> Money {
    records.iter().map(|r| r.amount).sum()
}

/// Revenue divided by the number of sales; zero when there are none.
#[must_use]
pub fn average_order_value(records: &[SaleRecord]) -> Money {
    total_revenue(records).split(records.len())
}

/// Group sales by calendar month, oldest first. Months without sales are
/// omitted; see [`trailing_months`] for a gap-free series.
#[must_use]
pub fn monthly_buckets(records: &[SaleRecord]) -> Vec<MonthBucket> {
    let mut by_month: BTreeMap<(i32, u32), MonthBucket> = BTreeMap::new();
    for record in records {
        let key = (record.created_at.year(), record.created_at.month());
        let bucket = by_month
            .entry(key)
            .or_insert_with(|| MonthBucket::empty(key.0, key.1));
        bucket.order_count += 1;
        bucket.revenue += record.amount;
    }
    by_month.into_values().collect()
}

/// The `n` calendar months ending with the month of `end`, oldest first,
/// with zero-filled months where nothing sold. Sales outside the range are
/// ignored.
#[must_use]
pub fn trailing_months(records: &[SaleRecord], end: DateTime<Utc>, n: u32) -> Vec<MonthBucket> {
    let mut months = Vec::with_capacity(usize::try_from(n).unwrap_or(0));
    let (mut year, mut month) = (end.year(), end.month());
    for _ in 0..n {
        months.push(MonthBucket::empty(year, month));
        if month == 1 {
            year -= 1;
            month = 12;
        } else {
            month -= 1;
        }
    }
    months.reverse();

    let sold: HashMap<(i32, u32), MonthBucket> = monthly_buckets(records)
        .into_iter()
        .map(|b| ((b.year, b.month), b))
        .collect();

    for month in &mut months {
        if let Some(bucket) = sold.get(&(month.year, month.month)) {
            *month = *bucket;
        }
    }
    months
}

/// Gross sales and the commission owed on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommissionSummary {
    pub order_count: usize,
    pub gross: Money,
    pub commission: Money,
    /// What remains of `gross` after commission.
    pub net: Money,
}

/// Commission is computed per order and then summed, matching what each
/// order's detail page shows.
#[must_use]
pub fn commission_summary(records: &[SaleRecord], rate: Percent) -> CommissionSummary {
    CommissionSummary {
        order_count: records.len(),
        gross: total_revenue(records),
        commission: records
            .iter()
            .map(|r| pricing::commission(r.amount, rate))
            .sum(),
        net: records
            .iter()
            .map(|r| pricing::vendor_net(r.amount, rate))
            .sum(),
    }
}

/// One sold order line, for best-seller tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSale {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub revenue: Money,
}

/// Best sellers by units sold, ties broken by revenue then name.
#[must_use]
pub fn top_products(items: &[ItemSale], limit: usize) -> Vec<ItemSale> {
    let mut totals: HashMap<ProductId, ItemSale> = HashMap::new();
    for item in items {
        totals
            .entry(item.product_id)
            .and_modify(|t| {
                t.quantity += item.quantity;
                t.revenue += item.revenue;
            })
            .or_insert_with(|| item.clone());
    }

    let mut ranked: Vec<ItemSale> = totals.into_values().collect();
    ranked.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then(b.revenue.cmp(&a.revenue))
            .then_with(|| a.product_name.cmp(&b.product_name))
    });
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn sale(y: i32, m: u32, d: u32, amount: &str) -> SaleRecord {
        SaleRecord {
            created_at: at(y, m, d),
            amount: amount.parse().unwrap(),
        }
    }

    fn sample() -> Vec<SaleRecord> {
        vec![
            sale(2026, 1, 3, "10.00"),
            sale(2026, 1, 28, "15.50"),
            sale(2025, 12, 31, "4.50"),
            sale(2026, 3, 1, "100.00"),
        ]
    }

    #[test]
    fn test_total_revenue_is_sum() {
        assert_eq!(total_revenue(&sample()), "130.00".parse().unwrap());
        assert_eq!(total_revenue(&[]), Money::ZERO);
    }

    #[test]
    fn test_average_order_value() {
        assert_eq!(average_order_value(&sample()), "32.50".parse().unwrap());
        assert_eq!(average_order_value(&[]), Money::ZERO);
    }

    #[test]
    fn test_monthly_buckets_sorted_and_partitioning() {
        let buckets = monthly_buckets(&sample());
        let keys: Vec<(i32, u32)> = buckets.iter().map(|b| (b.year, b.month)).collect();
        assert_eq!(keys, vec![(2025, 12), (2026, 1), (2026, 3)]);

        let jan = buckets.get(1).unwrap();
        assert_eq!(jan.order_count, 2);
        assert_eq!(jan.revenue, "25.50".parse().unwrap());

        let sum: Money = buckets.iter().map(|b| b.revenue).sum();
        assert_eq!(sum, total_revenue(&sample()));
    }

    #[test]
    fn test_trailing_months_fills_gaps_across_year_boundary() {
        let months = trailing_months(&sample(), at(2026, 3, 15), 4);
        let keys: Vec<(i32, u32)> = months.iter().map(|b| (b.year, b.month)).collect();
        assert_eq!(keys, vec![(2025, 12), (2026, 1), (2026, 2), (2026, 3)]);
        assert_eq!(months.get(2).unwrap().order_count, 0);
        assert_eq!(months.get(3).unwrap().revenue, "100.00".parse().unwrap());
    }

    #[test]
    fn test_trailing_months_ignores_older_sales() {
        let months = trailing_months(&sample(), at(2026, 3, 15), 1);
        assert_eq!(months.len(), 1);
        assert_eq!(months.first().unwrap().order_count, 1);
    }

    #[test]
    fn test_month_label() {
        assert_eq!(MonthBucket::empty(2026, 3).label(), "Mar 2026");
        assert_eq!(MonthBucket::empty(2025, 12).label(), "Dec 2025");
    }

    #[test]
    fn test_commission_summary() {
        let summary = commission_summary(&sample(), Percent::whole(10));
        assert_eq!(summary.order_count, 4);
        assert_eq!(summary.gross, "130.00".parse().unwrap());
        // 1.00 + 1.55 + 0.45 + 10.00
        assert_eq!(summary.commission, "13.00".parse().unwrap());
        assert_eq!(summary.net, "117.00".parse().unwrap());
        assert_eq!(summary.net + summary.commission, summary.gross);
    }

    #[test]
    fn test_top_products() {
        let item = |id: i32, name: &str, qty: u32, rev: &str| ItemSale {
            product_id: ProductId::new(id),
            product_name: name.to_owned(),
            quantity: qty,
            revenue: rev.parse().unwrap(),
        };
        let items = vec![
            item(1, "Mug", 2, "20.00"),
            item(2, "Tee", 3, "45.00"),
            item(1, "Mug", 2, "20.00"),
            item(3, "Cap", 4, "30.00"),
        ];
        let top = top_products(&items, 2);
        let names: Vec<&str> = top.iter().map(|i| i.product_name.as_str()).collect();
        // Mug and Cap both sold 4; Mug earned more.
        assert_eq!(names, vec!["Mug", "Cap"]);
        assert_eq!(top.first().unwrap().revenue, "40.00".parse().unwrap());
    }
}
