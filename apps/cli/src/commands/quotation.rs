//! # Quotation Commands
//!
//! Building the draft from selections and submitting it.
//!
//! ## Submission Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  submit_quotation(client form)                                          │
//! │                                                                         │
//! │  1. validate client fields ──── invalid ──► SubmitError::InvalidClient  │
//! │                                             (no store call)             │
//! │  2. draft empty? ───────────── yes ──────► SubmitError::Rejected        │
//! │                                                                         │
//! │  3. fresh product snapshot ──► revalidate_stock ─ short ─► Rejected     │
//! │                                                                         │
//! │  4. Backend::create_quotation ─ header + items + stock, one write       │
//! │          │                          fails ──► SubmitError::CreationFailed│
//! │          ▼                          (nothing stored)                    │
//! │     draft cleared                                                       │
//! │                                                                         │
//! │  5. export (reload, render, print, share)                               │
//! │          ├── ok ────► ExportStatus::Exported { path }                   │
//! │          └── fails ─► ExportStatus::Degraded { reason }                 │
//! │                       quotation stays saved; retry from history         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::commands::history::{export_quotation, ExportSettings};
use crate::error::{ApiError, ApiResult};
use crate::print::PrintService;
use crate::state::{DraftState, ExportState, SessionState};
use colva_core::validation::ClientValidation;
use colva_core::{Amounts, ClientForm, Money, TaxRate};
use colva_db::Backend;

// =============================================================================
// Selections
// =============================================================================

/// One `ENVIRONMENT:PRODUCT_ID:QUANTITY` argument.
///
/// The environment label may itself contain `:`; the last two fields are
/// always the product id and the quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRequest {
    pub environment: String,
    pub product_id: i64,
    pub quantity: i64,
}

impl FromStr for SelectionRequest {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.rsplitn(3, ':');
        let quantity = parts.next();
        let product_id = parts.next();
        let environment = parts.next();

        let (Some(environment), Some(product_id), Some(quantity)) =
            (environment, product_id, quantity)
        else {
            return Err(ApiError::validation(format!(
                "Selection '{}' must look like ENVIRONMENT:PRODUCT_ID:QUANTITY",
                s
            )));
        };

        let product_id = product_id
            .trim()
            .parse::<i64>()
            .map_err(|_| ApiError::validation(format!("Invalid product id in '{}'", s)))?;
        let quantity = quantity
            .trim()
            .parse::<i64>()
            .map_err(|_| ApiError::validation(format!("Invalid quantity in '{}'", s)))?;

        Ok(SelectionRequest {
            environment: environment.trim().to_string(),
            product_id,
            quantity,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftLine {
    pub environment: String,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: String,
    pub line_total: String,
}

/// The draft as shown before submitting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftSummary {
    pub lines: Vec<DraftLine>,
    pub amounts: Amounts,
}

/// Applies selections to the draft, in order.
///
/// Unknown environments are created on first use. Each selection replaces
/// the quantity of that (environment, product); the first one that breaks
/// the stock rule stops the run and leaves the draft as it was before it.
pub async fn apply_selections(
    backend: &dyn Backend,
    draft: &DraftState,
    selections: &[SelectionRequest],
) -> ApiResult<()> {
    let mut ids: Vec<i64> = selections.iter().map(|s| s.product_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let products = backend.get_products(&ids).await?;

    for selection in selections {
        let product = products
            .iter()
            .find(|p| p.id == selection.product_id)
            .ok_or_else(|| ApiError::not_found("Product", &selection.product_id.to_string()))?;

        draft.with_draft_mut(|d| -> ApiResult<()> {
            let exists = d
                .environments()
                .iter()
                .any(|env| env.label == selection.environment);
            if !exists {
                d.add_named_environment(&selection.environment)?;
            }
            if let Err(e) = d.set_quantity(&selection.environment, product, selection.quantity) {
                if !exists {
                    let _ = d.remove_environment(&selection.environment);
                }
                return Err(e.into());
            }
            Ok(())
        })?;

        debug!(
            environment = %selection.environment,
            product_id = product.id,
            quantity = selection.quantity,
            "Selection applied"
        );
    }

    Ok(())
}

pub fn draft_summary(draft: &DraftState, rate: TaxRate) -> ApiResult<DraftSummary> {
    draft.with_draft(|d| {
        let lines = d
            .line_items()
            .into_iter()
            .map(|item| {
                let unit_price = Money::from_cents(item.unit_price_cents);
                let line_total = unit_price
                    .checked_times(item.quantity)
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "-".to_string());
                DraftLine {
                    environment: item.environment,
                    product_id: item.product_id,
                    product_name: item.product_name,
                    quantity: item.quantity,
                    unit_price: unit_price.to_string(),
                    line_total,
                }
            })
            .collect();

        Ok(DraftSummary {
            lines,
            amounts: d.amounts(rate)?,
        })
    })
}

// =============================================================================
// Submission
// =============================================================================

/// How the post-save export went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExportStatus {
    Exported { path: PathBuf },
    /// The quotation is saved; only the document failed.
    Degraded { reason: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationOutcome {
    pub quotation_id: i64,
    pub amounts: Amounts,
    pub export: ExportStatus,
}

impl QuotationOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self.export, ExportStatus::Degraded { .. })
    }
}

#[derive(Debug, Error)]
pub enum SubmitError {
    /// Per-field client errors. Nothing was sent to the store.
    #[error("Client data is invalid: {}", .0.messages().join("; "))]
    InvalidClient(ClientValidation),

    /// Rejected before the write (empty draft, stock moved).
    #[error("{0}")]
    Rejected(ApiError),

    /// The atomic write failed; nothing was stored.
    #[error("Quotation could not be created: {0}")]
    CreationFailed(ApiError),
}

/// Validates, persists and exports the current draft.
pub async fn submit_quotation(
    backend: &dyn Backend,
    printer: &dyn PrintService,
    draft: &DraftState,
    exports: &ExportState,
    session: &SessionState,
    settings: &ExportSettings,
    client: ClientForm,
) -> Result<QuotationOutcome, SubmitError> {
    let client = client.into_client().map_err(SubmitError::InvalidClient)?;

    let snapshot = draft.snapshot();
    if snapshot.is_empty() {
        return Err(SubmitError::Rejected(ApiError::validation(
            "Add at least one product before continuing",
        )));
    }

    let mut ids: Vec<i64> = snapshot.line_items().iter().map(|i| i.product_id).collect();
    ids.sort_unstable();
    ids.dedup();

    let latest = backend
        .get_products(&ids)
        .await
        .map_err(|e| SubmitError::Rejected(e.into()))?;
    snapshot
        .revalidate_stock(&latest)
        .map_err(|e| SubmitError::Rejected(e.into()))?;

    let new_quotation = snapshot
        .to_new_quotation(session.user_id(), client, settings.tax_rate)
        .map_err(|e| SubmitError::Rejected(e.into()))?;

    let quotation = backend
        .create_quotation(&new_quotation)
        .await
        .map_err(|e| {
            warn!(error = %e, "Quotation write failed");
            SubmitError::CreationFailed(e.into())
        })?;

    info!(
        quotation_id = quotation.id,
        total = %new_quotation.amounts.total,
        "Quotation saved"
    );
    draft.clear();

    let export = match export_quotation(backend, printer, exports, session, settings, quotation.id)
        .await
    {
        Ok(path) => ExportStatus::Exported { path },
        Err(e) => {
            warn!(quotation_id = quotation.id, error = %e, "Quotation saved, export failed");
            ExportStatus::Degraded { reason: e.message }
        }
    };

    Ok(QuotationOutcome {
        quotation_id: quotation.id,
        amounts: new_quotation.amounts,
        export,
    })
}
