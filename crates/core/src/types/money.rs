//! Decimal money and percentage types.
//!
//! All amounts are in a single store currency. Arithmetic is exact decimal;
//! rounding to cents happens only where a value is charged or displayed.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Mul};
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing [`Money`] or [`Percent`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The input is not a decimal number.
    #[error("not a valid amount: {0}")]
    Invalid(String),
    /// Money amounts cannot be negative.
    #[error("amount cannot be negative")]
    Negative,
    /// Percentages must be within 0..=100.
    #[error("percentage must be between 0 and 100")]
    OutOfRange,
}

/// A non-negative amount of money in the store currency.
///
/// ```
/// use bazaar_core::Money;
///
/// let price: Money = "19.99".parse().unwrap();
/// assert_eq!((price * 3).to_string(), "$59.97");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Negative` for amounts below zero.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        Ok(Self(amount))
    }

    /// Build an amount from integer cents.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Round to whole cents, half away from zero.
    #[must_use]
    pub fn round_cents(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Whether this is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Subtract, flooring at zero.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        if other.0 >= self.0 {
            Self::ZERO
        } else {
            Self(self.0 - other.0)
        }
    }

    /// Divide evenly by a count (zero for a zero count), rounded to cents.
    #[must_use]
    pub fn split(self, count: usize) -> Self {
        if count == 0 {
            return Self::ZERO;
        }
        Self(self.0 / Decimal::from(count)).round_cents()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.round_cents().0)
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('$');
        let amount =
            Decimal::from_str(trimmed).map_err(|_| MoneyError::Invalid(s.to_owned()))?;
        Self::new(amount)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Self> for Money {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// A percentage in `0..=100`, used for tax and commission rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Percent(Decimal);

impl Percent {
    /// Zero percent.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a percentage value such as `8.25` for 8.25%.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::OutOfRange` outside `0..=100`.
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            return Err(MoneyError::OutOfRange);
        }
        Ok(Self(value))
    }

    /// Whole-number percentage. Values above 100 are clamped.
    #[must_use]
    pub fn whole(value: u8) -> Self {
        Self(Decimal::from(value.min(100)))
    }

    /// The percentage value (e.g. `8.25`).
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.0
    }

    /// Apply this percentage to an amount, rounded to cents.
    #[must_use]
    pub fn of(&self, amount: Money) -> Money {
        Money(amount.0 * self.0 / Decimal::ONE_HUNDRED).round_cents()
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

impl FromStr for Percent {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('%');
        let value =
            Decimal::from_str(trimmed).map_err(|_| MoneyError::Invalid(s.to_owned()))?;
        Self::new(value)
    }
}

impl TryFrom<Decimal> for Percent {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percent> for Decimal {
    fn from(p: Percent) -> Self {
        p.0
    }
}

// SQLx support (with postgres feature). Both map to NUMERIC columns whose
// CHECK constraints match the invariants above.
#[cfg(feature = "postgres")]
mod pg {
    use rust_decimal::Decimal;

    use super::{Money, Percent};

    macro_rules! numeric_newtype {
        ($name:ident) => {
            impl sqlx::Type<sqlx::Postgres> for $name {
                fn type_info() -> sqlx::postgres::PgTypeInfo {
                    <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
                }

                fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                    <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
                }
            }

            impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
                fn decode(
                    value: sqlx::postgres::PgValueRef<'r>,
                ) -> Result<Self, sqlx::error::BoxDynError> {
                    let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                    Ok(Self::new(amount)?)
                }
            }

            impl sqlx::Encode<'_, sqlx::Postgres> for $name {
                fn encode_by_ref(
                    &self,
                    buf: &mut sqlx::postgres::PgArgumentBuffer,
                ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                    <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
                }
            }
        };
    }

    numeric_newtype!(Money);
    numeric_newtype!(Percent);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_money() {
        assert_eq!("12.50".parse::<Money>().unwrap(), Money::from_cents(1250));
        assert_eq!("$3".parse::<Money>().unwrap(), Money::from_cents(300));
        assert_eq!("-1".parse::<Money>(), Err(MoneyError::Negative));
        assert!(matches!("abc".parse::<Money>(), Err(MoneyError::Invalid(_))));
    }

    #[test]
    fn test_display_rounds_half_away_from_zero() {
        let m = Money::new(Decimal::new(10_005, 3)).unwrap(); // 10.005
        assert_eq!(m.to_string(), "$10.01");
        assert_eq!(Money::ZERO.to_string(), "$0.00");
    }

    #[test]
    fn test_sum_and_mul() {
        let prices = [Money::from_cents(199), Money::from_cents(1)];
        let total: Money = prices.iter().sum();
        assert_eq!(total, Money::from_cents(200));
        assert_eq!(Money::from_cents(250) * 4, Money::from_cents(1000));
    }

    #[test]
    fn test_saturating_sub() {
        let a = Money::from_cents(100);
        let b = Money::from_cents(250);
        assert_eq!(a.saturating_sub(b), Money::ZERO);
        assert_eq!(b.saturating_sub(a), Money::from_cents(150));
    }

    #[test]
    fn test_split() {
        assert_eq!(Money::from_cents(1000).split(3), Money::from_cents(333));
        assert_eq!(Money::from_cents(1000).split(0), Money::ZERO);
    }

    #[test]
    fn test_percent_range() {
        assert!("100".parse::<Percent>().is_ok());
        assert!("0".parse::<Percent>().is_ok());
        assert_eq!("100.01".parse::<Percent>(), Err(MoneyError::OutOfRange));
        assert_eq!("-1".parse::<Percent>(), Err(MoneyError::OutOfRange));
        assert_eq!("8.25%".parse::<Percent>().unwrap().to_string(), "8.25%");
    }

    #[test]
    fn test_percent_of() {
        let rate: Percent = "8.25".parse().unwrap();
        // 19.99 * 0.0825 = 1.649175 -> 1.65
        assert_eq!(rate.of(Money::from_cents(1999)), Money::from_cents(165));
        assert_eq!(Percent::ZERO.of(Money::from_cents(1999)), Money::ZERO);
    }

    #[test]
    fn test_percent_serde_rejects_out_of_range() {
        assert!(serde_json::from_str::<Percent>("\"150\"").is_err());
        let p: Percent = serde_json::from_str("\"12.5\"").unwrap();
        assert_eq!(p.value(), Decimal::new(125, 1));
    }
}
