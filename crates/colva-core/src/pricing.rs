//! # Pricing
//!
//! Line totals, quotation amounts and stock checks.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lines ──► compute_line_total(qty, price) ──► Σ ──► subtotal           │
//! │                                                       │                 │
//! │                                       subtotal × 19% ─┴─► tax           │
//! │                                                       │                 │
//! │                                        subtotal + tax ─► total          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tax is computed once on the subtotal, not per line, so the rounding
//! happens exactly once per quotation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{LineItemDetail, NewLineItem, Product, QuotationLineItem, TaxRate};

// =============================================================================
// Amounts
// =============================================================================

/// Subtotal, tax and total of a quotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Amounts {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

// =============================================================================
// Priced Lines
// =============================================================================

/// Anything with a quantity and a unit price.
pub trait Priced {
    fn quantity(&self) -> i64;
    fn unit_price(&self) -> Money;
    /// Used in error messages.
    fn label(&self) -> String;
}

impl Priced for NewLineItem {
    fn quantity(&self) -> i64 {
        self.quantity
    }

    fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    fn label(&self) -> String {
        self.product_name.clone()
    }
}

impl Priced for QuotationLineItem {
    fn quantity(&self) -> i64 {
        self.quantity
    }

    fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    fn label(&self) -> String {
        format!("product {}", self.product_id)
    }
}

impl Priced for LineItemDetail {
    fn quantity(&self) -> i64 {
        self.quantity
    }

    fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    fn label(&self) -> String {
        self.product_name
            .clone()
            .unwrap_or_else(|| format!("product {}", self.product_id))
    }
}

// =============================================================================
// Operations
// =============================================================================

/// `quantity × unit_price`.
///
/// ## Errors
/// - [`CoreError::NegativeQuantity`] when `quantity < 0`
/// - [`CoreError::AmountOverflow`] when the product does not fit in i64 cents
///
/// ```rust
/// use colva_core::money::Money;
/// use colva_core::pricing::compute_line_total;
///
/// let total = compute_line_total(2, Money::from_major(100)).unwrap();
/// assert_eq!(total, Money::from_major(200));
/// assert!(compute_line_total(-1, Money::from_major(100)).is_err());
/// ```
pub fn compute_line_total(quantity: i64, unit_price: Money) -> CoreResult<Money> {
    line_total_for("line", quantity, unit_price)
}

fn line_total_for(label: &str, quantity: i64, unit_price: Money) -> CoreResult<Money> {
    if quantity < 0 {
        return Err(CoreError::NegativeQuantity {
            product: label.to_string(),
            quantity,
        });
    }

    unit_price
        .checked_times(quantity)
        .ok_or_else(|| CoreError::AmountOverflow {
            context: label.to_string(),
        })
}

/// Amounts at the default 19% rate.
pub fn compute_amounts<P: Priced>(lines: &[P]) -> CoreResult<Amounts> {
    compute_amounts_with_rate(lines, TaxRate::default())
}

/// Amounts at an explicit rate.
///
/// An empty slice yields all-zero amounts; rejecting empty quotations is the
/// caller's decision.
pub fn compute_amounts_with_rate<P: Priced>(lines: &[P], rate: TaxRate) -> CoreResult<Amounts> {
    let mut subtotal = Money::zero();

    for line in lines {
        let label = line.label();
        let line_total = line_total_for(&label, line.quantity(), line.unit_price())?;
        subtotal = subtotal
            .checked_add(line_total)
            .ok_or(CoreError::AmountOverflow { context: label })?;
    }

    let tax = subtotal
        .checked_tax(rate)
        .ok_or_else(|| CoreError::AmountOverflow {
            context: "tax".to_string(),
        })?;
    let total = subtotal
        .checked_add(tax)
        .ok_or_else(|| CoreError::AmountOverflow {
            context: "total".to_string(),
        })?;

    Ok(Amounts {
        subtotal,
        tax,
        total,
    })
}

/// Fails when `requested_total` exceeds the product's units.
///
/// `requested_total` is the quantity summed over every environment of the
/// draft, not a single selection.
pub fn validate_stock(product: &Product, requested_total: i64) -> CoreResult<()> {
    if !product.has_stock(requested_total) {
        return Err(CoreError::InsufficientStock {
            product: product.name.clone(),
            available: product.units,
            requested: requested_total,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(name: &str, units: i64, cost_cents: i64) -> Product {
        Product {
            id: 1,
            name: name.to_string(),
            units,
            unit_cost_cents: cost_cents,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(quantity: i64, unit_price_cents: i64) -> NewLineItem {
        NewLineItem {
            environment: "Ambiente 1".to_string(),
            product_id: 1,
            product_name: "Lamp".to_string(),
            quantity,
            unit_price_cents,
        }
    }

    #[test]
    fn test_single_line_scenario() {
        // qty 2 × 100 → 200 / 38 / 238
        let amounts = compute_amounts(&[line(2, 10_000)]).unwrap();
        assert_eq!(amounts.subtotal, Money::from_major(200));
        assert_eq!(amounts.tax, Money::from_major(38));
        assert_eq!(amounts.total, Money::from_major(238));
    }

    #[test]
    fn test_subtotal_is_sum_of_lines() {
        let lines = [line(3, 22_307_600), line(1, 6_187_600), line(0, 9_163_600)];
        let amounts = compute_amounts(&lines).unwrap();
        assert_eq!(amounts.subtotal.cents(), 3 * 22_307_600 + 6_187_600);
        assert_eq!(amounts.total, amounts.subtotal + amounts.tax);
        assert_eq!(amounts.tax, amounts.subtotal.calculate_tax(TaxRate::from_bps(1900)));
    }

    #[test]
    fn test_tax_rounds_half_up_once() {
        // 0.05 × 19% = 0.0095 → 0.01
        let amounts = compute_amounts(&[line(1, 5)]).unwrap();
        assert_eq!(amounts.tax.cents(), 1);
        assert_eq!(amounts.total.cents(), 6);
    }

    #[test]
    fn test_empty_lines_are_zero() {
        let amounts = compute_amounts::<NewLineItem>(&[]).unwrap();
        assert_eq!(amounts, Amounts::default());
    }

    #[test]
    fn test_custom_rate() {
        let amounts = compute_amounts_with_rate(&[line(1, 1000)], TaxRate::zero()).unwrap();
        assert_eq!(amounts.tax, Money::zero());
        assert_eq!(amounts.total.cents(), 1000);
    }

    #[test]
    fn test_negative_quantity_fails() {
        let err = compute_amounts(&[line(-2, 100)]).unwrap_err();
        assert_eq!(
            err,
            CoreError::NegativeQuantity {
                product: "Lamp".to_string(),
                quantity: -2
            }
        );
    }

    #[test]
    fn test_overflow_is_an_error() {
        assert!(matches!(
            compute_line_total(2, Money::from_cents(i64::MAX)),
            Err(CoreError::AmountOverflow { .. })
        ));
        assert!(compute_amounts(&[line(1, i64::MAX), line(1, 1)]).is_err());
    }

    #[test]
    fn test_validate_stock_boundaries() {
        let lamp = product("Lamp", 10, 100);
        assert!(validate_stock(&lamp, 0).is_ok());
        assert!(validate_stock(&lamp, 10).is_ok());
        assert_eq!(
            validate_stock(&lamp, 11),
            Err(CoreError::InsufficientStock {
                product: "Lamp".to_string(),
                available: 10,
                requested: 11
            })
        );
    }
}
