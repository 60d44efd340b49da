//! Value Objects for the storefront

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog document identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(value: impl Into<String>) -> Self { Self(value.into()) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self { Self::new(value) }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self { Self(value) }
}

/// Money in major currency units, converted to integer minor units at the gateway boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self { Self(amount) }
    pub fn amount(&self) -> Decimal { self.0 }

    /// Rounds half away from zero, so 19.995 becomes 2000 cents.
    pub fn to_minor_units(&self) -> Result<i64, MoneyError> {
        self.0.checked_mul(Decimal::ONE_HUNDRED)
            .ok_or(MoneyError::Overflow)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .ok_or(MoneyError::Overflow)
    }

    pub fn from_minor_units(minor: i64) -> Self { Self(Decimal::new(minor, 2)) }

    /// Saturates at the largest representable amount.
    pub fn multiply(&self, qty: u32) -> Money { Money(self.0.saturating_mul(Decimal::from(qty))) }

    /// Applies a percentage discount in the range 0..=100.
    pub fn discounted(&self, percent: Decimal) -> Money {
        Money(self.0 * (Decimal::ONE - percent / Decimal::ONE_HUNDRED))
    }
}

impl std::ops::Add for Money {
    type Output = Money;
    fn add(self, rhs: Money) -> Money { Money(self.0.saturating_add(rhs.0)) }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money { iter.fold(Money::ZERO, |acc, m| acc + m) }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:.2}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("amount does not fit in minor units")]
    Overflow,
}

/// Positive item quantity. Zero is never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub const ONE: Quantity = Quantity(1);

    pub fn new(value: u32) -> Option<Self> { (value > 0).then_some(Self(value)) }
    pub fn value(&self) -> u32 { self.0 }

    /// Applies a signed delta; `None` means the entry must be dropped.
    pub fn offset(&self, delta: i64) -> Option<Self> {
        let next = i64::from(self.0).saturating_add(delta);
        if next <= 0 { None } else { Some(Self(u32::try_from(next).unwrap_or(u32::MAX))) }
    }
}

impl TryFrom<u32> for Quantity {
    type Error = String;
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Quantity::new(value).ok_or_else(|| "quantity must be at least 1".to_string())
    }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> u32 { q.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_units_round_half_up() {
        assert_eq!(Money::new(Decimal::new(19995, 3)).to_minor_units().unwrap(), 2000);
        assert_eq!(Money::new(Decimal::new(1999, 2)).to_minor_units().unwrap(), 1999);
        assert_eq!(Money::new(Decimal::new(10, 0)).to_minor_units().unwrap(), 1000);
    }

    #[test]
    fn test_huge_amounts_do_not_panic() {
        let huge = Money::new(Decimal::MAX);
        assert_eq!(huge.to_minor_units(), Err(MoneyError::Overflow));
        assert_eq!(Money::new(Decimal::new(i64::MAX, 0)).to_minor_units(), Err(MoneyError::Overflow));
        assert_eq!(huge.multiply(2), huge);
        assert_eq!(huge + huge, huge);
        assert_eq!([huge, Money::new(Decimal::ONE)].into_iter().sum::<Money>(), huge);
    }

    #[test]
    fn test_from_minor_units() {
        assert_eq!(Money::from_minor_units(2550).amount(), Decimal::new(2550, 2));
    }

    #[test]
    fn test_discount() {
        let price = Money::new(Decimal::new(200, 0));
        assert_eq!(price.discounted(Decimal::new(25, 0)).amount(), Decimal::new(150, 0));
        assert_eq!(price.discounted(Decimal::ZERO), price);
    }

    #[test]
    fn test_quantity_offset() {
        let q = Quantity::new(2).unwrap();
        assert_eq!(q.offset(3).map(|q| q.value()), Some(5));
        assert_eq!(q.offset(-1).map(|q| q.value()), Some(1));
        assert!(q.offset(-2).is_none());
        assert!(Quantity::new(0).is_none());
    }

    #[test]
    fn test_quantity_rejects_zero_on_deserialize() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("4").unwrap().value(), 4);
    }
}
