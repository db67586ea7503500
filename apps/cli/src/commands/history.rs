//! # History Commands
//!
//! Read-only view over the signed-in user's quotations, plus document
//! export.
//!
//! ## Export Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  export_quotation(id)                                                   │
//! │                                                                         │
//! │  get_quotation(id) ──► None? NotFound                                   │
//! │       │                                                                 │
//! │  quotation_items(id) ─► joined with current product names               │
//! │       │                                                                 │
//! │  QuotationDocument::build ──► no items? "quotation has no details"      │
//! │       │                                                                 │
//! │  render ──► PrintService::print_to_file ──► share                       │
//! │       │                                                                 │
//! │  ExportState::record(path)                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Polling
//! `watch_history` re-reads the list on a fixed `tokio::time::interval`.
//! There is no push channel; each tick is one plain list call.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::print::PrintService;
use crate::state::{ExportState, SessionState};
use colva_core::document::{DocumentOptions, QuotationDocument};
use colva_core::{CoreError, LineItemDetail, Quotation, TaxRate};
use colva_db::Backend;

/// Document settings that come from configuration.
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub company_name: String,
    pub tax_rate: TaxRate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationDetails {
    pub quotation: Quotation,
    pub items: Vec<LineItemDetail>,
}

/// The user's quotations, newest first.
pub async fn list_history(
    backend: &dyn Backend,
    session: &SessionState,
) -> ApiResult<Vec<Quotation>> {
    debug!(user_id = session.user_id(), "list_history command");
    Ok(backend.list_quotations(session.user_id()).await?)
}

/// Loads a quotation the session may see: its own, or any for an admin.
async fn load_visible(
    backend: &dyn Backend,
    session: &SessionState,
    quotation_id: i64,
) -> ApiResult<Quotation> {
    let quotation = backend
        .get_quotation(quotation_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Quotation", &quotation_id.to_string()))?;

    if quotation.user_id != session.user_id() && !session.is_admin() {
        // Reported as missing so ids of other users' quotations are not confirmed.
        return Err(ApiError::not_found("Quotation", &quotation_id.to_string()));
    }

    Ok(quotation)
}

/// Header plus items. A quotation without items is an error.
pub async fn quotation_details(
    backend: &dyn Backend,
    session: &SessionState,
    quotation_id: i64,
) -> ApiResult<QuotationDetails> {
    let quotation = load_visible(backend, session, quotation_id).await?;
    let items = backend.quotation_items(quotation_id).await?;

    if items.is_empty() {
        return Err(ApiError::new(
            crate::error::ErrorCode::BusinessLogic,
            format!("Quotation {} has no details", quotation_id),
        ));
    }

    Ok(QuotationDetails { quotation, items })
}

/// Renders, writes and shares the document for a stored quotation.
pub async fn export_quotation(
    backend: &dyn Backend,
    printer: &dyn PrintService,
    exports: &ExportState,
    session: &SessionState,
    settings: &ExportSettings,
    quotation_id: i64,
) -> ApiResult<PathBuf> {
    debug!(quotation_id, "export_quotation command");

    let quotation = load_visible(backend, session, quotation_id).await?;
    let items = backend.quotation_items(quotation_id).await?;

    let generated_at = Utc::now();
    let document = QuotationDocument::build(
        &quotation,
        &items,
        DocumentOptions {
            company_name: settings.company_name.clone(),
            tax_rate: settings.tax_rate,
            generated_by: Some(session.user.username.clone()),
            generated_at,
        },
    )
    .map_err(|e| match e {
        CoreError::EmptyQuotation => {
            ApiError::export(format!("Quotation {} has no details", quotation_id))
        }
        other => ApiError::from(other),
    })?;

    let rendered = document.render(generated_at)?;
    let path = printer.print_to_file(&rendered)?;

    if !printer.share(&path) {
        warn!(path = %path.display(), "Document written but not shared");
        return Err(ApiError::export(format!(
            "Document saved at {} but could not be shared",
            path.display()
        )));
    }

    exports.record(&path);
    info!(quotation_id, path = %path.display(), "Quotation exported");
    Ok(path)
}

/// Re-shares the last generated document.
pub fn open_last_document(
    printer: &dyn PrintService,
    exports: &ExportState,
) -> ApiResult<PathBuf> {
    let path = exports
        .last()
        .ok_or_else(|| ApiError::not_found("Document", "no document generated yet"))?;

    if !printer.share(&path) {
        return Err(ApiError::export(format!(
            "Document {} is no longer available",
            path.display()
        )));
    }
    Ok(path)
}

/// Polls the history every `every`, calling `on_refresh` with each result.
///
/// Runs `max_ticks` refreshes, or forever when `None`. A failed refresh is
/// passed to `on_refresh` and polling continues.
pub async fn watch_history<F>(
    backend: &dyn Backend,
    session: &SessionState,
    every: Duration,
    max_ticks: Option<usize>,
    mut on_refresh: F,
) where
    F: FnMut(ApiResult<Vec<Quotation>>),
{
    let mut interval = tokio::time::interval(every);
    let mut ticks = 0usize;

    loop {
        if max_ticks.is_some_and(|max| ticks >= max) {
            break;
        }
        interval.tick().await;
        ticks += 1;

        let result = list_history(backend, session).await;
        if let Err(e) = &result {
            warn!(error = %e, "History refresh failed");
        }
        on_refresh(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::print::LocalPrintService;
    use colva_core::pricing::Amounts;
    use colva_core::{ClientInfo, DocumentType, Money, NewLineItem, NewQuotation, Role, UserProfile};
    use colva_db::{seed_defaults, MemoryBackend};
    use colva_db::seed::DEFAULT_ADMIN_ID;

    fn admin() -> SessionState {
        SessionState::new(UserProfile {
            id: DEFAULT_ADMIN_ID,
            username: "admin".into(),
            role: Role::Admin,
        })
    }

    fn settings() -> ExportSettings {
        ExportSettings {
            company_name: "COLVA APP".into(),
            tax_rate: TaxRate::default(),
        }
    }

    async fn stored_quotation(backend: &MemoryBackend) -> Quotation {
        let subtotal = Money::from_cents(22_307_600);
        let tax = subtotal.calculate_tax(TaxRate::default());
        backend
            .create_quotation(&NewQuotation {
                user_id: DEFAULT_ADMIN_ID,
                client: ClientInfo {
                    document_type: DocumentType::CC,
                    document_number: "12345678".into(),
                    names: "Ana".into(),
                    surnames: "Gomez".into(),
                    phone: "3001234567".into(),
                    email: None,
                },
                amounts: Amounts {
                    subtotal,
                    tax,
                    total: subtotal + tax,
                },
                items: vec![NewLineItem {
                    environment: "Sala".into(),
                    product_id: 1,
                    product_name: "Google Assistant Nest".into(),
                    quantity: 1,
                    unit_price_cents: 22_307_600,
                }],
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_export_writes_and_records_document() {
        let backend = MemoryBackend::new();
        seed_defaults(&backend).await.unwrap();
        let quotation = stored_quotation(&backend).await;

        let dir = tempfile::tempdir().unwrap();
        let printer = LocalPrintService::new(dir.path());
        let exports = ExportState::new();

        let path = export_quotation(&backend, &printer, &exports, &admin(), &settings(), quotation.id)
            .await
            .unwrap();

        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains(&format!("Cotización #{}", quotation.id)));
        assert!(html.contains("Sala"));
        assert!(html.contains("admin"));
        assert_eq!(exports.last(), Some(path.clone()));
        assert_eq!(open_last_document(&printer, &exports).unwrap(), path);
    }

    #[tokio::test]
    async fn test_other_users_quotations_are_hidden() {
        let backend = MemoryBackend::new();
        seed_defaults(&backend).await.unwrap();
        let quotation = stored_quotation(&backend).await;

        let client = SessionState::new(UserProfile {
            id: 52123456,
            username: "ana".into(),
            role: Role::Client,
        });
        let err = quotation_details(&backend, &client, quotation.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(list_history(&backend, &client).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_last_without_document() {
        let dir = tempfile::tempdir().unwrap();
        let printer = LocalPrintService::new(dir.path());
        let err = open_last_document(&printer, &ExportState::new()).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_watch_polls_fixed_number_of_times() {
        let backend = MemoryBackend::new();
        seed_defaults(&backend).await.unwrap();
        stored_quotation(&backend).await;

        let mut sizes = Vec::new();
        watch_history(&backend, &admin(), Duration::from_millis(5), Some(3), |r| {
            sizes.push(r.unwrap().len())
        })
        .await;

        assert_eq!(sizes, vec![1, 1, 1]);
    }
}
