//! Money value object.
//!
//! Amounts are kept as signed minor units (cents) so sums and comparisons are
//! exact. Rates and ratios are computed in `f64` and rounded back to cents at
//! the boundary.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Largest magnitude accepted from floating point input (about 90 trillion).
const MAX_MAJOR: f64 = 9.0e13;

/// An amount of money in cents.
///
/// On the wire this serializes as a decimal number of major units
/// (`1234.5` is `$1,234.50`).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(i64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Whole major units (e.g. `Money::from_units(300)` is `$300.00`).
    pub const fn from_units(units: i64) -> Self {
        Self(units * 100)
    }

    /// Convert a decimal major-unit amount, rounding half away from zero to cents.
    pub fn from_major(value: f64) -> DomainResult<Self> {
        if !value.is_finite() {
            return Err(DomainError::validation("amount must be a finite number"));
        }
        if value.abs() > MAX_MAJOR {
            return Err(DomainError::validation("amount is out of range"));
        }
        Ok(Self((value * 100.0).round() as i64))
    }

    /// Round a fractional cent value (e.g. accrued interest) to whole cents.
    pub fn from_cents_f64(cents: f64) -> Self {
        if cents.is_finite() {
            Self(cents.round() as i64)
        } else {
            Self::ZERO
        }
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub fn to_major(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    pub fn saturating_sub(self, rhs: Money) -> Money {
        Money(self.0.saturating_sub(rhs.0))
    }

    /// `self - rhs`, floored at zero.
    pub fn floor_sub(self, rhs: Money) -> Money {
        Money((self.0 - rhs.0).max(0))
    }

    /// Multiply by a ratio and round to cents.
    pub fn scale(self, factor: f64) -> Money {
        Money::from_cents_f64(self.0 as f64 * factor)
    }

    /// `self / other` as a plain ratio. `None` when `other` is zero.
    pub fn ratio_to(self, other: Money) -> Option<f64> {
        if other.0 == 0 {
            None
        } else {
            Some(self.0 as f64 / other.0 as f64)
        }
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::format::currency(*self))
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_major())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Money::from_major(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn from_major_rounds_to_cents() {
        assert_eq!(Money::from_major(19.99).unwrap().cents(), 1999);
        assert_eq!(Money::from_major(0.125).unwrap().cents(), 13);
        assert_eq!(Money::from_major(-2.5).unwrap().cents(), -250);
        assert_eq!(Money::from_major(0.0).unwrap(), Money::ZERO);
    }

    #[test]
    fn from_major_rejects_non_finite() {
        assert!(Money::from_major(f64::NAN).is_err());
        assert!(Money::from_major(f64::INFINITY).is_err());
        assert!(Money::from_major(1.0e20).is_err());
    }

    #[test]
    fn floor_sub_never_goes_negative() {
        let a = Money::from_units(50);
        let b = Money::from_units(80);
        assert_eq!(a.floor_sub(b), Money::ZERO);
        assert_eq!(b.floor_sub(a), Money::from_units(30));
    }

    #[test]
    fn serializes_as_major_units() {
        let json = serde_json::to_string(&Money::from_cents(123_450)).unwrap();
        assert_eq!(json, "1234.5");

        let back: Money = serde_json::from_str("1234.5").unwrap();
        assert_eq!(back.cents(), 123_450);

        let whole: Money = serde_json::from_str("200").unwrap();
        assert_eq!(whole, Money::from_units(200));
    }

    #[test]
    fn checked_and_saturating_arithmetic_at_the_edges() {
        let max = Money::from_cents(i64::MAX);
        assert_eq!(max.checked_add(Money::from_cents(1)), None);
        assert_eq!(Money::from_units(2).checked_add(Money::from_units(3)), Some(Money::from_units(5)));
        assert_eq!(Money::from_cents(i64::MIN).saturating_sub(Money::from_cents(1)), Money::from_cents(i64::MIN));
        assert_eq!(Money::from_units(5).saturating_sub(Money::from_units(8)), Money::from_units(-3));
    }

    #[test]
    fn ratio_to_zero_is_none() {
        assert_eq!(Money::from_units(1).ratio_to(Money::ZERO), None);
        assert_eq!(Money::from_units(1).ratio_to(Money::from_units(4)), Some(0.25));
    }

    proptest! {
        #[test]
        fn sum_matches_cent_arithmetic(values in prop::collection::vec(-1_000_000i64..1_000_000i64, 0..50)) {
            let total: Money = values.iter().map(|c| Money::from_cents(*c)).sum();
            prop_assert_eq!(total.cents(), values.iter().sum::<i64>());
        }
    }
}
