//! Cart and order totals.
//!
//! These functions are the single source of truth for money math: the cart
//! page, checkout, POS and the order repository all go through [`quote`].

use serde::{Deserialize, Serialize};

use crate::types::{Money, Percent};

/// Largest quantity a single cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Clamp a requested quantity into `1..=MAX_LINE_QUANTITY`.
#[must_use]
pub fn clamp_quantity(quantity: u32) -> u32 {
    quantity.clamp(1, MAX_LINE_QUANTITY)
}

/// A line with a known unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub unit_price: Money,
    pub quantity: u32,
}

impl PricedLine {
    #[must_use]
    pub const fn new(unit_price: Money, quantity: u32) -> Self {
        Self {
            unit_price,
            quantity,
        }
    }

    /// `unit_price × quantity`.
    #[must_use]
    pub fn total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// Σ `unit_price × quantity`.
#[must_use]
pub fn subtotal(lines: &[PricedLine]) -> Money {
    lines.iter().map(PricedLine::total).sum()
}

/// Tax owed on a subtotal at a flat rate, rounded to cents.
#[must_use]
pub fn tax(subtotal: Money, rate: Percent) -> Money {
    rate.of(subtotal)
}

/// Commission earned on an order total, rounded to cents.
#[must_use]
pub fn commission(order_total: Money, rate: Percent) -> Money {
    rate.of(order_total)
}

/// What a vendor keeps after the platform's commission.
///
/// `vendor_net(g, r) + commission(g, r) == g` for every `g` and `r`.
#[must_use]
pub fn vendor_net(gross: Money, platform_rate: Percent) -> Money {
    gross.saturating_sub(commission(gross, platform_rate))
}

/// Flat-rate shipping with an optional free-shipping threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingPolicy {
    pub flat_fee: Money,
    pub free_over: Option<Money>,
}

impl ShippingPolicy {
    /// No shipping charge at all (used for in-store sales).
    pub const FREE: Self = Self {
        flat_fee: Money::ZERO,
        free_over: None,
    };

    /// Shipping charged for an order with the given subtotal.
    #[must_use]
    pub fn charge(&self, subtotal: Money, item_count: u32) -> Money {
        if item_count == 0 {
            return Money::ZERO;
        }
        match self.free_over {
            Some(threshold) if subtotal >= threshold => Money::ZERO,
            _ => self.flat_fee,
        }
    }

    /// How much more the customer must spend to get free shipping.
    #[must_use]
    pub fn remaining_for_free(&self, subtotal: Money) -> Option<Money> {
        self.free_over
            .map(|threshold| threshold.saturating_sub(subtotal))
            .filter(|remaining| !remaining.is_zero())
    }
}

/// Totals shown on the cart page and stored on an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Money,
    pub tax: Money,
    pub shipping: Money,
    pub total: Money,
    pub item_count: u32,
}

impl Totals {
    /// Totals of an empty cart.
    pub const EMPTY: Self = Self {
        subtotal: Money::ZERO,
        tax: Money::ZERO,
        shipping: Money::ZERO,
        total: Money::ZERO,
        item_count: 0,
    };
}

/// Price a set of lines: subtotal, tax on the subtotal, shipping, total.
#[must_use]
pub fn quote(lines: &[PricedLine], tax_rate: Percent, shipping: &ShippingPolicy) -> Totals {
    let subtotal = subtotal(lines);
    let item_count = lines.iter().map(|l| l.quantity).sum();
    let tax = tax(subtotal, tax_rate);
    let shipping = shipping.charge(subtotal, item_count);

    Totals {
        subtotal,
        tax,
        shipping,
        total: subtotal + tax + shipping,
        item_count,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    fn policy() -> ShippingPolicy {
        ShippingPolicy {
            flat_fee: money("5.00"),
            free_over: Some(money("50.00")),
        }
    }

    #[test]
    fn test_subtotal_is_sum_of_price_times_quantity() {
        let lines = [
            PricedLine::new(money("10.00"), 2),
            PricedLine::new(money("2.50"), 3),
        ];
        assert_eq!(subtotal(&lines), money("27.50"));
        assert_eq!(subtotal(&[]), Money::ZERO);
    }

    #[test]
    fn test_quote_under_free_shipping() {
        let lines = [PricedLine::new(money("20.00"), 1)];
        let totals = quote(&lines, Percent::whole(8), &policy());
        assert_eq!(totals.subtotal, money("20.00"));
        assert_eq!(totals.tax, money("1.60"));
        assert_eq!(totals.shipping, money("5.00"));
        assert_eq!(totals.total, money("26.60"));
        assert_eq!(totals.item_count, 1);
    }

    #[test]
    fn test_quote_free_shipping_at_threshold() {
        let lines = [PricedLine::new(money("25.00"), 2)];
        let totals = quote(&lines, Percent::whole(10), &policy());
        assert_eq!(totals.shipping, Money::ZERO);
        assert_eq!(totals.total, money("55.00"));
    }

    #[test]
    fn test_quote_empty_cart() {
        assert_eq!(quote(&[], Percent::whole(8), &policy()), Totals::EMPTY);
    }

    #[test]
    fn test_total_identity() {
        let lines = [
            PricedLine::new(money("3.33"), 3),
            PricedLine::new(money("0.99"), 7),
        ];
        let t = quote(&lines, "7.25".parse().unwrap(), &policy());
        assert_eq!(t.total, t.subtotal + t.tax + t.shipping);
    }

    #[test]
    fn test_commission_and_vendor_net_partition_gross() {
        let rates = ["0", "5", "12.5", "33.33", "100"];
        let amounts = ["0.01", "9.99", "100.00", "1234.57"];
        for rate in rates {
            let rate: Percent = rate.parse().unwrap();
            for gross in amounts {
                let gross = money(gross);
                assert_eq!(vendor_net(gross, rate) + commission(gross, rate), gross);
            }
        }
    }

    #[test]
    fn test_commission_rounding() {
        // 123.45 * 7.5% = 9.25875
        assert_eq!(commission(money("123.45"), "7.5".parse().unwrap()), money("9.26"));
    }

    #[test]
    fn test_remaining_for_free_shipping() {
        assert_eq!(policy().remaining_for_free(money("42.00")), Some(money("8.00")));
        assert_eq!(policy().remaining_for_free(money("60.00")), None);
        assert_eq!(ShippingPolicy::FREE.remaining_for_free(money("1.00")), None);
    }

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(0), 1);
        assert_eq!(clamp_quantity(5), 5);
        assert_eq!(clamp_quantity(1000), MAX_LINE_QUANTITY);
    }
}
