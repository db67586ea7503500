//! # Quotation Draft
//!
//! In-memory quotation being assembled: environments, selections, amounts.
//! Nothing here is persisted until the draft is submitted.
//!
//! ## Draft Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  new() ──► [Ambiente 1]                                                 │
//! │              │                                                          │
//! │              ├── add_environment()      ──► [Ambiente 1, Ambiente 2]    │
//! │              ├── set_quantity(env, p, n) ──► stock checked across ALL   │
//! │              │                               environments               │
//! │              ├── set_quantity(env, p, 0) ──► selection removed          │
//! │              └── amounts()              ──► recomputed on every read    │
//! │                                                                         │
//! │  submit:                                                                │
//! │    revalidate_stock(latest catalog) ──► to_new_quotation(user, client)  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock Invariant
//! For every product, the quantities selected over all environments never
//! add up to more than the product's units. A rejected `set_quantity`
//! leaves the draft untouched.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::pricing::{compute_amounts_with_rate, validate_stock, Amounts, Priced};
use crate::types::{ClientInfo, NewLineItem, NewQuotation, Product, TaxRate};
use crate::validation::validate_environment_label;
use crate::DEFAULT_ENVIRONMENT_PREFIX;

// =============================================================================
// Selection & Environment
// =============================================================================

/// A product chosen inside one environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Selection {
    pub product_id: i64,
    /// Product name at selection time (frozen).
    pub product_name: String,
    /// Unit price in cents at selection time (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
}

impl Priced for Selection {
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

/// A named group of selections (a room, a floor, a site).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Environment {
    pub label: String,
    pub selections: Vec<Selection>,
}

impl Environment {
    fn new(label: impl Into<String>) -> Self {
        Environment {
            label: label.into(),
            selections: Vec::new(),
        }
    }

    /// `None` on i64 overflow.
    fn quantity_of(&self, product_id: i64) -> Option<i64> {
        self.selections
            .iter()
            .filter(|s| s.product_id == product_id)
            .try_fold(0i64, |acc, s| acc.checked_add(s.quantity))
    }
}

// =============================================================================
// Draft
// =============================================================================

/// The quotation under construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuotationDraft {
    environments: Vec<Environment>,
}

impl Default for QuotationDraft {
    fn default() -> Self {
        QuotationDraft::new()
    }
}

impl QuotationDraft {
    /// A draft with a single empty `Ambiente 1`.
    pub fn new() -> Self {
        QuotationDraft {
            environments: vec![Environment::new(format!(
                "{} 1",
                DEFAULT_ENVIRONMENT_PREFIX
            ))],
        }
    }

    pub fn environments(&self) -> &[Environment] {
        &self.environments
    }

    /// Appends the next `Ambiente N` and returns its label.
    pub fn add_environment(&mut self) -> String {
        let mut n = self.environments.len() + 1;
        let label = loop {
            let candidate = format!("{} {}", DEFAULT_ENVIRONMENT_PREFIX, n);
            if self.find(&candidate).is_none() {
                break candidate;
            }
            n += 1;
        };

        self.environments.push(Environment::new(label.clone()));
        label
    }

    /// Appends an environment with a caller-chosen label.
    pub fn add_named_environment(&mut self, label: &str) -> CoreResult<()> {
        validate_environment_label(label)?;
        let label = label.trim();

        if self.find(label).is_some() {
            return Err(ValidationError::Duplicate {
                field: "environment".to_string(),
                value: label.to_string(),
            }
            .into());
        }

        self.environments.push(Environment::new(label));
        Ok(())
    }

    /// Removes an environment and everything selected in it.
    pub fn remove_environment(&mut self, label: &str) -> CoreResult<()> {
        let index = self
            .position(label)
            .ok_or_else(|| CoreError::EnvironmentNotFound(label.to_string()))?;

        if self.environments.len() == 1 {
            return Err(CoreError::LastEnvironment(label.to_string()));
        }

        self.environments.remove(index);
        Ok(())
    }

    /// Sets the quantity of `product` inside `environment`.
    ///
    /// - `0` removes the selection.
    /// - Negative quantities are rejected.
    /// - The total over every environment is checked against
    ///   `product.units`; on failure the draft is unchanged.
    ///
    /// ```rust
    /// use chrono::Utc;
    /// use colva_core::draft::QuotationDraft;
    /// use colva_core::Product;
    ///
    /// let lamp = Product {
    ///     id: 1, name: "Lamp".into(), units: 10, unit_cost_cents: 100,
    ///     created_at: Utc::now(), updated_at: Utc::now(),
    /// };
    /// let mut draft = QuotationDraft::new();
    /// let second = draft.add_environment();
    ///
    /// draft.set_quantity("Ambiente 1", &lamp, 6).unwrap();
    /// assert!(draft.set_quantity(&second, &lamp, 5).is_err()); // 11 > 10
    /// assert_eq!(draft.quantity_for(lamp.id), 6);
    /// ```
    pub fn set_quantity(
        &mut self,
        environment: &str,
        product: &Product,
        quantity: i64,
    ) -> CoreResult<()> {
        if quantity < 0 {
            return Err(CoreError::NegativeQuantity {
                product: product.name.clone(),
                quantity,
            });
        }

        let index = self
            .position(environment)
            .ok_or_else(|| CoreError::EnvironmentNotFound(environment.to_string()))?;

        let requested = self
            .total_quantity(product.id, Some(index))
            .and_then(|elsewhere| elsewhere.checked_add(quantity))
            .ok_or_else(|| overflowing_request(product))?;
        validate_stock(product, requested)?;

        let env = &mut self.environments[index];
        let existing = env
            .selections
            .iter()
            .position(|s| s.product_id == product.id);

        match (existing, quantity) {
            (Some(i), 0) => {
                env.selections.remove(i);
            }
            (Some(i), _) => {
                env.selections[i].quantity = quantity;
            }
            (None, 0) => {}
            (None, _) => env.selections.push(Selection {
                product_id: product.id,
                product_name: product.name.clone(),
                unit_price_cents: product.unit_cost_cents,
                quantity,
            }),
        }

        Ok(())
    }

    /// Quantity of a product summed over every environment.
    ///
    /// Saturates at `i64::MAX`.
    pub fn quantity_for(&self, product_id: i64) -> i64 {
        self.total_quantity(product_id, None).unwrap_or(i64::MAX)
    }

    /// Checked sum over every environment except `skip`.
    fn total_quantity(&self, product_id: i64, skip: Option<usize>) -> Option<i64> {
        self.environments
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != skip)
            .try_fold(0i64, |acc, (_, env)| acc.checked_add(env.quantity_of(product_id)?))
    }

    pub fn is_empty(&self) -> bool {
        self.environments.iter().all(|env| env.selections.is_empty())
    }

    /// Back to a single empty `Ambiente 1`.
    pub fn clear(&mut self) {
        *self = QuotationDraft::new();
    }

    /// Flattened line items in environment order.
    pub fn line_items(&self) -> Vec<NewLineItem> {
        self.environments
            .iter()
            .flat_map(|env| {
                env.selections.iter().map(move |s| NewLineItem {
                    environment: env.label.clone(),
                    product_id: s.product_id,
                    product_name: s.product_name.clone(),
                    quantity: s.quantity,
                    unit_price_cents: s.unit_price_cents,
                })
            })
            .collect()
    }

    /// Current amounts at `rate`. Recomputed from the selections every call.
    pub fn amounts(&self, rate: TaxRate) -> CoreResult<Amounts> {
        compute_amounts_with_rate(&self.line_items(), rate)
    }

    /// Re-checks every selected product against a fresh catalog snapshot.
    ///
    /// Stock may have moved since the selections were made (another user
    /// quoted the same product). Products missing from `latest` fail with
    /// [`CoreError::ProductNotFound`].
    pub fn revalidate_stock(&self, latest: &[Product]) -> CoreResult<()> {
        let mut seen: Vec<i64> = Vec::new();

        for item in self.line_items() {
            if seen.contains(&item.product_id) {
                continue;
            }
            seen.push(item.product_id);

            let product = latest
                .iter()
                .find(|p| p.id == item.product_id)
                .ok_or(CoreError::ProductNotFound(item.product_id))?;
            let requested = self
                .total_quantity(item.product_id, None)
                .ok_or_else(|| overflowing_request(product))?;
            validate_stock(product, requested)?;
        }

        Ok(())
    }

    /// Builds the persistence payload.
    ///
    /// Fails with [`CoreError::EmptyQuotation`] when nothing is selected.
    pub fn to_new_quotation(
        &self,
        user_id: i64,
        client: ClientInfo,
        rate: TaxRate,
    ) -> CoreResult<NewQuotation> {
        if self.is_empty() {
            return Err(CoreError::EmptyQuotation);
        }

        let items = self.line_items();
        let amounts = compute_amounts_with_rate(&items, rate)?;

        Ok(NewQuotation {
            user_id,
            client,
            amounts,
            items,
        })
    }

    fn position(&self, label: &str) -> Option<usize> {
        let label = label.trim();
        self.environments.iter().position(|env| env.label == label)
    }

    fn find(&self, label: &str) -> Option<&Environment> {
        self.position(label).map(|i| &self.environments[i])
    }
}

/// A total too large for i64 is more than any product can hold.
fn overflowing_request(product: &Product) -> CoreError {
    CoreError::InsufficientStock {
        product: product.name.clone(),
        available: product.units,
        requested: i64::MAX,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentType;
    use chrono::Utc;

    fn product(id: i64, name: &str, units: i64, cost_cents: i64) -> Product {
        Product {
            id,
            name: name.to_string(),
            units,
            unit_cost_cents: cost_cents,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn client() -> ClientInfo {
        ClientInfo {
            document_type: DocumentType::CC,
            document_number: "12345678".to_string(),
            names: "Ana".to_string(),
            surnames: "Gomez".to_string(),
            phone: "3001234567".to_string(),
            email: None,
        }
    }

    #[test]
    fn test_starts_with_one_environment() {
        let draft = QuotationDraft::new();
        assert_eq!(draft.environments().len(), 1);
        assert_eq!(draft.environments()[0].label, "Ambiente 1");
        assert!(draft.is_empty());
    }

    #[test]
    fn test_add_environment_numbers_sequentially() {
        let mut draft = QuotationDraft::new();
        assert_eq!(draft.add_environment(), "Ambiente 2");
        assert_eq!(draft.add_environment(), "Ambiente 3");

        draft.remove_environment("Ambiente 2").unwrap();
        // Next free number, no duplicate "Ambiente 3"
        assert_eq!(draft.add_environment(), "Ambiente 4");
    }

    #[test]
    fn test_named_environment_rules() {
        let mut draft = QuotationDraft::new();
        draft.add_named_environment("Cocina").unwrap();
        assert!(matches!(
            draft.add_named_environment(" Cocina "),
            Err(CoreError::Validation(ValidationError::Duplicate { .. }))
        ));
        assert!(draft.add_named_environment("").is_err());
    }

    #[test]
    fn test_cannot_remove_last_environment() {
        let mut draft = QuotationDraft::new();
        assert_eq!(
            draft.remove_environment("Ambiente 1"),
            Err(CoreError::LastEnvironment("Ambiente 1".to_string()))
        );
        assert_eq!(
            draft.remove_environment("Sala"),
            Err(CoreError::EnvironmentNotFound("Sala".to_string()))
        );
    }

    #[test]
    fn test_stock_shared_across_environments() {
        let lamp = product(1, "Lamp", 10, 100);
        let mut draft = QuotationDraft::new();
        let second = draft.add_environment();

        draft.set_quantity("Ambiente 1", &lamp, 6).unwrap();
        let before = draft.clone();

        let err = draft.set_quantity(&second, &lamp, 5).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientStock {
                product: "Lamp".to_string(),
                available: 10,
                requested: 11
            }
        );
        assert_eq!(draft, before);

        draft.set_quantity(&second, &lamp, 4).unwrap();
        assert_eq!(draft.quantity_for(lamp.id), 10);
    }

    #[test]
    fn test_huge_quantity_across_environments_is_rejected() {
        let lamp = product(1, "Lamp", 10, 100);
        let mut draft = QuotationDraft::new();
        let second = draft.add_environment();

        draft.set_quantity("Ambiente 1", &lamp, 5).unwrap();
        let before = draft.clone();

        let err = draft.set_quantity(&second, &lamp, i64::MAX).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { available: 10, .. }));
        assert_eq!(draft, before);
        assert_eq!(draft.quantity_for(lamp.id), 5);
    }

    #[test]
    fn test_revalidate_rejects_overflowing_totals() {
        let lamp = product(1, "Lamp", i64::MAX, 100);
        let mut draft = QuotationDraft::new();
        let second = draft.add_environment();

        draft.set_quantity("Ambiente 1", &lamp, i64::MAX - 1).unwrap();
        assert!(draft.set_quantity(&second, &lamp, 2).is_err());

        // Bypass set_quantity to build a draft whose total cannot be summed.
        draft.environments[1].selections = draft.environments[0].selections.clone();
        assert_eq!(draft.quantity_for(lamp.id), i64::MAX);
        assert!(matches!(
            draft.revalidate_stock(&[lamp]),
            Err(CoreError::InsufficientStock { .. })
        ));
    }

    #[test]
    fn test_set_quantity_replaces_not_adds() {
        let lamp = product(1, "Lamp", 10, 100);
        let mut draft = QuotationDraft::new();

        draft.set_quantity("Ambiente 1", &lamp, 8).unwrap();
        // Replacing 8 with 9 in the same environment checks 9, not 17
        draft.set_quantity("Ambiente 1", &lamp, 9).unwrap();
        assert_eq!(draft.quantity_for(lamp.id), 9);
        assert_eq!(draft.environments()[0].selections.len(), 1);
    }

    #[test]
    fn test_zero_removes_selection() {
        let lamp = product(1, "Lamp", 10, 100);
        let mut draft = QuotationDraft::new();

        draft.set_quantity("Ambiente 1", &lamp, 3).unwrap();
        draft.set_quantity("Ambiente 1", &lamp, 0).unwrap();
        assert!(draft.is_empty());

        // Zero on a product never selected is a no-op
        draft.set_quantity("Ambiente 1", &lamp, 0).unwrap();
        assert!(draft.is_empty());
    }

    #[test]
    fn test_negative_and_unknown_environment() {
        let lamp = product(1, "Lamp", 10, 100);
        let mut draft = QuotationDraft::new();
        assert!(matches!(
            draft.set_quantity("Ambiente 1", &lamp, -1),
            Err(CoreError::NegativeQuantity { .. })
        ));
        assert!(matches!(
            draft.set_quantity("Patio", &lamp, 1),
            Err(CoreError::EnvironmentNotFound(_))
        ));
    }

    #[test]
    fn test_price_is_frozen_at_selection() {
        let mut lamp = product(1, "Lamp", 10, 100);
        let mut draft = QuotationDraft::new();
        draft.set_quantity("Ambiente 1", &lamp, 2).unwrap();

        lamp.unit_cost_cents = 999;
        draft.set_quantity("Ambiente 1", &lamp, 3).unwrap();
        assert_eq!(draft.line_items()[0].unit_price_cents, 100);
    }

    #[test]
    fn test_amounts_recomputed() {
        let a = product(1, "Nest", 140, 10_000);
        let b = product(2, "Foco", 30, 5_000);
        let mut draft = QuotationDraft::new();
        let second = draft.add_environment();

        draft.set_quantity("Ambiente 1", &a, 2).unwrap();
        draft.set_quantity(&second, &b, 2).unwrap();

        let amounts = draft.amounts(TaxRate::default()).unwrap();
        assert_eq!(amounts.subtotal, Money::from_major(300));
        assert_eq!(amounts.tax, Money::from_major(57));
        assert_eq!(amounts.total, Money::from_major(357));

        draft.set_quantity(&second, &b, 0).unwrap();
        let amounts = draft.amounts(TaxRate::default()).unwrap();
        assert_eq!(amounts.total, Money::from_major(238));
    }

    #[test]
    fn test_revalidate_against_latest_catalog() {
        let lamp = product(1, "Lamp", 10, 100);
        let mut draft = QuotationDraft::new();
        let second = draft.add_environment();
        draft.set_quantity("Ambiente 1", &lamp, 4).unwrap();
        draft.set_quantity(&second, &lamp, 4).unwrap();

        assert!(draft.revalidate_stock(&[lamp.clone()]).is_ok());

        let sold_elsewhere = product(1, "Lamp", 7, 100);
        assert_eq!(
            draft.revalidate_stock(&[sold_elsewhere]),
            Err(CoreError::InsufficientStock {
                product: "Lamp".to_string(),
                available: 7,
                requested: 8
            })
        );

        assert_eq!(draft.revalidate_stock(&[]), Err(CoreError::ProductNotFound(1)));
    }

    #[test]
    fn test_to_new_quotation() {
        let lamp = product(1, "Lamp", 10, 10_000);
        let mut draft = QuotationDraft::new();

        assert_eq!(
            draft.to_new_quotation(7, client(), TaxRate::default()),
            Err(CoreError::EmptyQuotation)
        );

        draft.set_quantity("Ambiente 1", &lamp, 2).unwrap();
        let new = draft.to_new_quotation(7, client(), TaxRate::default()).unwrap();
        assert_eq!(new.user_id, 7);
        assert_eq!(new.items.len(), 1);
        assert_eq!(new.items[0].environment, "Ambiente 1");
        assert_eq!(new.amounts.total, Money::from_major(238));

        draft.clear();
        assert!(draft.is_empty());
        assert_eq!(draft.environments().len(), 1);
    }
}
