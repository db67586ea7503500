//! # Money Module
//!
//! Integer money for quotations. Every amount is a count of cents (centavos).
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  QUOTATION MATH WITH FLOATS                                             │
//! │                                                                         │
//! │    2 × 223076.00 = 446152.00                                            │
//! │    446152.00 × 0.19 = 84768.88000000001   ❌                            │
//! │                                                                         │
//! │  WITH CENTS                                                             │
//! │    2 × 22_307_600 = 44_615_200                                          │
//! │    44_615_200 × 1900 bps = 8_476_888      ✅ exact, then rounded once   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Display
//! Amounts print in es-CO style: `$1.234.567,89` (dot thousands, comma
//! decimals), which is what the quotation documents show.
//!
//! ```rust
//! use colva_core::money::Money;
//!
//! let cost: Money = "223076.00".parse().unwrap();
//! assert_eq!(cost.cents(), 22_307_600);
//! assert_eq!(cost.to_string(), "$223.076,00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents.
///
/// ```text
/// Product.unit_cost_cents ──► Selection.unit_price ──► line total
///                                                        │
///                               Σ line totals ◄──────────┘
///                                   │
///                         subtotal ─┼─► tax (19%) ─► total
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from whole currency units.
    ///
    /// ```rust
    /// use colva_core::money::Money;
    /// assert_eq!(Money::from_major(100).cents(), 10_000);
    /// ```
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whole units, truncated toward zero.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Cents part, always 0-99.
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Tax on this amount, rounded half-up to the cent.
    ///
    /// ## Formula
    /// `(cents × bps + 5000) / 10000` computed in i128, so a 19% rate over
    /// any i64 subtotal cannot overflow the intermediate product.
    ///
    /// ```rust
    /// use colva_core::money::Money;
    /// use colva_core::types::TaxRate;
    ///
    /// // 0.50 at 19% = 0.095 → 0.10
    /// let tax = Money::from_cents(50).calculate_tax(TaxRate::from_bps(1900));
    /// assert_eq!(tax.cents(), 10);
    /// ```
    ///
    /// Saturates at the i64 bounds; [`Money::checked_tax`] reports it instead.
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        self.checked_tax(rate).unwrap_or(if self.0 >= 0 {
            Money(i64::MAX)
        } else {
            Money(i64::MIN)
        })
    }

    /// Tax on this amount, `None` when it does not fit in i64 cents.
    pub fn checked_tax(&self, rate: TaxRate) -> Option<Money> {
        let raw = i128::from(self.0) * i128::from(rate.bps());
        // Half-up away from zero, symmetric for negative amounts
        let rounded = if raw >= 0 {
            (raw + 5000) / 10000
        } else {
            (raw - 5000) / 10000
        };
        i64::try_from(rounded).ok().map(Money)
    }

    /// Multiplies by a quantity, `None` on overflow.
    #[inline]
    pub fn checked_times(&self, quantity: i64) -> Option<Money> {
        self.0.checked_mul(quantity).map(Money)
    }

    /// Adds two amounts, `None` on overflow.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.major().unsigned_abs().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        write!(f, "{}${},{:02}", sign, grouped, self.minor())
    }
}

/// Parses plain decimal strings as stored by the catalog (`"223076.00"`,
/// `"61876"`, `"0.5"`). At most two decimals; no thousands separators.
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ValidationError::required("amount"));
        }

        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (whole, fraction) = match body.split_once('.') {
            Some((w, f)) => (w, f),
            None => (body, ""),
        };

        if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::invalid("amount", "expected digits"));
        }
        if fraction.len() > 2 || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::invalid(
                "amount",
                "at most two decimal digits",
            ));
        }

        let overflow = || ValidationError::invalid("amount", "value too large");
        let major: i64 = whole.parse().map_err(|_| overflow())?;
        let minor: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| overflow())? * 10,
            _ => fraction.parse().map_err(|_| overflow())?,
        };

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(overflow)?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parts() {
        let money = Money::from_cents(22_307_650);
        assert_eq!(money.major(), 223_076);
        assert_eq!(money.minor(), 50);
        assert_eq!(Money::from_cents(-550).minor(), 50);
    }

    #[test]
    fn test_display_es_co() {
        assert_eq!(Money::from_cents(0).to_string(), "$0,00");
        assert_eq!(Money::from_cents(99).to_string(), "$0,99");
        assert_eq!(Money::from_major(238).to_string(), "$238,00");
        assert_eq!(Money::from_cents(123_456_789).to_string(), "$1.234.567,89");
        assert_eq!(Money::from_major(-1000).to_string(), "-$1.000,00");
    }

    #[test]
    fn test_parse() {
        assert_eq!("223076.00".parse::<Money>().unwrap().cents(), 22_307_600);
        assert_eq!("61876".parse::<Money>().unwrap().cents(), 6_187_600);
        assert_eq!("0.5".parse::<Money>().unwrap().cents(), 50);
        assert_eq!("-5.25".parse::<Money>().unwrap().cents(), -525);
        assert!("".parse::<Money>().is_err());
        assert!("12.345".parse::<Money>().is_err());
        assert!("1.234,00".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("99999999999999999999".parse::<Money>().is_err());
    }

    #[test]
    fn test_tax_nineteen_percent() {
        let rate = TaxRate::from_bps(1900);
        assert_eq!(Money::from_major(200).calculate_tax(rate), Money::from_major(38));
        // 0.05 × 19% = 0.0095 → 0.01
        assert_eq!(Money::from_cents(5).calculate_tax(rate).cents(), 1);
        // 0.02 × 19% = 0.0038 → 0.00
        assert_eq!(Money::from_cents(2).calculate_tax(rate).cents(), 0);
        assert_eq!(Money::from_cents(-50).calculate_tax(rate).cents(), -10);
    }

    #[test]
    fn test_tax_at_the_i64_edge() {
        let full = TaxRate::from_bps(10_000);
        let max = Money::from_cents(i64::MAX);
        let min = Money::from_cents(i64::MIN);
        assert_eq!(max.checked_tax(full), Some(max));
        assert_eq!(min.checked_tax(full), Some(min));

        let capped = TaxRate::from_bps(50_000);
        assert_eq!(capped, full);
        assert_eq!(Money::from_cents(1_000).calculate_tax(capped), Money::from_cents(1_000));
    }

    #[test]
    fn test_checked_arithmetic() {
        assert_eq!(
            Money::from_cents(299).checked_times(3),
            Some(Money::from_cents(897))
        );
        assert_eq!(Money::from_cents(i64::MAX).checked_times(2), None);
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 650].iter().map(|c| Money::from_cents(*c)).sum();
        assert_eq!(total.cents(), 1000);
    }
}
