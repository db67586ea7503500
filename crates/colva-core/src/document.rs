//! # Quotation Document
//!
//! Turns a persisted quotation and its line items into a printable document.
//! Rendering is pure; writing the file and handing it to the platform share
//! sheet belong to the app's print service.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  COLVA APP                                                              │
//! │  Cotización #42                              19 de octubre de 2026      │
//! │                                                                         │
//! │  Nombre:    Ana Gomez                                                   │
//! │  Documento: CC 12345678                                                 │
//! │  Teléfono:  3001234567                                                  │
//! │  Email:     No registrado                                               │
//! │                                                                         │
//! │  Ambiente 1                                                             │
//! │  ┌──────────────┬──────────┬─────────────────┬──────────────┐          │
//! │  │ Producto     │ Cantidad │ Precio Unitario │ Total        │          │
//! │  ├──────────────┼──────────┼─────────────────┼──────────────┤          │
//! │  │ Lamp         │ 2        │ $100,00         │ $200,00      │          │
//! │  └──────────────┴──────────┴─────────────────┴──────────────┘          │
//! │  (one table per environment, in order of first appearance)             │
//! │                                                                         │
//! │  Subtotal:   $200,00                                                    │
//! │  IVA (19%):  $38,00                                                     │
//! │  Total:      $238,00                                                    │
//! │                                                                         │
//! │  Cotización generada por: maria                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use askama::Template;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::{compute_line_total, Amounts};
use crate::types::{ClientInfo, LineItemDetail, Quotation, TaxRate};

/// Shown for products deleted after the quotation was made.
pub const MISSING_PRODUCT: &str = "N/A";

/// Shown for optional client fields left blank.
pub const NOT_PROVIDED: &str = "No registrado";

const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

// =============================================================================
// Document Model
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentRow {
    pub product: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct EnvironmentSection {
    pub label: String,
    pub rows: Vec<DocumentRow>,
}

/// Everything a quotation document shows, already grouped and priced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuotationDocument {
    pub quotation_id: i64,
    pub company_name: String,
    /// `19 de octubre de 2026`
    pub date_label: String,
    pub client: ClientInfo,
    pub sections: Vec<EnvironmentSection>,
    pub amounts: Amounts,
    pub tax_rate: TaxRate,
    pub generated_by: Option<String>,
}

/// Rendered payload handed to the print service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub quotation_id: i64,
    /// `cotizacion_<id>_<unix-millis>.html`
    pub file_name: String,
    pub content_type: &'static str,
    pub body: String,
}

// =============================================================================
// Building
// =============================================================================

/// Options that do not come from the stored quotation.
#[derive(Debug, Clone)]
pub struct DocumentOptions {
    pub company_name: String,
    pub tax_rate: TaxRate,
    pub generated_by: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl QuotationDocument {
    /// Groups `items` by environment (first-appearance order) and prices
    /// every row.
    ///
    /// Totals come from the stored header, not from re-summing, so the
    /// document always matches what was persisted.
    ///
    /// ## Errors
    /// [`CoreError::EmptyQuotation`] when `items` is empty: a quotation
    /// without details cannot be exported.
    pub fn build(
        quotation: &Quotation,
        items: &[LineItemDetail],
        options: DocumentOptions,
    ) -> CoreResult<Self> {
        if items.is_empty() {
            return Err(CoreError::EmptyQuotation);
        }

        let mut sections: Vec<EnvironmentSection> = Vec::new();
        for item in items {
            let unit_price = Money::from_cents(item.unit_price_cents);
            let row = DocumentRow {
                product: item
                    .product_name
                    .clone()
                    .unwrap_or_else(|| MISSING_PRODUCT.to_string()),
                quantity: item.quantity,
                unit_price,
                line_total: compute_line_total(item.quantity, unit_price)?,
            };

            match sections.iter_mut().find(|s| s.label == item.environment) {
                Some(section) => section.rows.push(row),
                None => sections.push(EnvironmentSection {
                    label: item.environment.clone(),
                    rows: vec![row],
                }),
            }
        }

        Ok(QuotationDocument {
            quotation_id: quotation.id,
            company_name: options.company_name,
            date_label: spanish_long_date(options.generated_at),
            client: quotation.client.clone(),
            sections,
            amounts: quotation.amounts(),
            tax_rate: options.tax_rate,
            generated_by: options.generated_by,
        })
    }

    /// Renders to a self-contained HTML page.
    pub fn render(&self, generated_at: DateTime<Utc>) -> CoreResult<RenderedDocument> {
        Ok(RenderedDocument {
            quotation_id: self.quotation_id,
            file_name: format!(
                "cotizacion_{}_{}.html",
                self.quotation_id,
                generated_at.timestamp_millis()
            ),
            content_type: "text/html; charset=utf-8",
            body: self.render_html()?,
        })
    }

    pub fn render_html(&self) -> CoreResult<String> {
        let page = QuotationPage {
            doc: self,
            client_name: self.client.full_name(),
            document_type: self.client.document_type.code(),
            email: self.client.email.as_deref().unwrap_or(NOT_PROVIDED),
            generated_by: self.generated_by.as_deref(),
        };
        page.render().map_err(|e| CoreError::Render(e.to_string()))
    }
}

/// HTML view of a [`QuotationDocument`]. Every interpolated value is escaped.
#[derive(Template)]
#[template(path = "quotation.html")]
struct QuotationPage<'a> {
    doc: &'a QuotationDocument,
    client_name: String,
    document_type: &'a str,
    email: &'a str,
    generated_by: Option<&'a str>,
}

// =============================================================================
// Helpers
// =============================================================================

/// `19 de octubre de 2026`
pub fn spanish_long_date(at: DateTime<Utc>) -> String {
    format!(
        "{} de {} de {}",
        at.day(),
        MONTHS[at.month0() as usize],
        at.year()
    )
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentType;
    use chrono::TimeZone;

    fn quotation() -> Quotation {
        Quotation {
            id: 42,
            user_id: 7,
            client: ClientInfo {
                document_type: DocumentType::CC,
                document_number: "12345678".to_string(),
                names: "Ana".to_string(),
                surnames: "Gomez".to_string(),
                phone: "3001234567".to_string(),
                email: None,
            },
            subtotal_cents: 30_000,
            tax_cents: 5_700,
            total_cents: 35_700,
            created_at: Utc::now(),
        }
    }

    fn item(id: i64, env: &str, name: Option<&str>, qty: i64, price: i64) -> LineItemDetail {
        LineItemDetail {
            id,
            quotation_id: 42,
            environment: env.to_string(),
            product_id: id,
            product_name: name.map(str::to_string),
            quantity: qty,
            unit_price_cents: price,
        }
    }

    fn options() -> DocumentOptions {
        DocumentOptions {
            company_name: "COLVA APP".to_string(),
            tax_rate: TaxRate::from_bps(1900),
            generated_by: Some("maria".to_string()),
            generated_at: Utc.with_ymd_and_hms(2026, 10, 19, 15, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_groups_by_environment_in_first_seen_order() {
        let items = [
            item(1, "Sala", Some("Lamp"), 2, 10_000),
            item(2, "Cocina", Some("Foco"), 1, 5_000),
            item(3, "Sala", None, 1, 5_000),
        ];
        let doc = QuotationDocument::build(&quotation(), &items, options()).unwrap();

        let labels: Vec<&str> = doc.sections.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Sala", "Cocina"]);
        assert_eq!(doc.sections[0].rows.len(), 2);
        assert_eq!(doc.sections[0].rows[0].line_total, Money::from_major(200));
        assert_eq!(doc.sections[0].rows[1].product, "N/A");
        assert_eq!(doc.amounts.total, Money::from_cents(35_700));
        assert_eq!(doc.date_label, "19 de octubre de 2026");
    }

    #[test]
    fn test_empty_items_cannot_be_exported() {
        assert_eq!(
            QuotationDocument::build(&quotation(), &[], options()),
            Err(CoreError::EmptyQuotation)
        );
    }

    #[test]
    fn test_render_html() {
        let items = [item(1, "Ambiente 1", Some("Lamp <RGB>"), 2, 10_000)];
        let opts = options();
        let at = opts.generated_at;
        let rendered = QuotationDocument::build(&quotation(), &items, opts)
            .unwrap()
            .render(at)
            .unwrap();

        assert_eq!(
            rendered.file_name,
            format!("cotizacion_42_{}.html", at.timestamp_millis())
        );
        let html = &rendered.body;
        assert!(html.contains("Cotización #42"));
        assert!(html.contains("Ana Gomez"));
        assert!(html.contains("CC 12345678"));
        assert!(html.contains("<h3>Ambiente 1</h3>"));
        assert!(html.contains("Lamp &lt;RGB&gt;"));
        assert!(html.contains("$100,00"));
        assert!(html.contains("IVA (19%):</strong> $57,00"));
        assert!(html.contains("$357,00"));
        assert!(html.contains("generada por: maria"));
        assert!(html.contains("<strong>Email:</strong> No registrado"));
        assert!(!html.contains("<strong>Email:</strong> N/A"));
    }

    #[test]
    fn test_client_text_is_escaped() {
        let mut quotation = quotation();
        quotation.client.names = "<script>alert('x')</script>".to_string();
        quotation.client.email = Some("ana@example.com".to_string());
        let items = [item(1, "Sala & Comedor", Some("Lamp"), 1, 10_000)];

        let html = QuotationDocument::build(&quotation, &items, options())
            .unwrap()
            .render_html()
            .unwrap();

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("<h3>Sala &amp; Comedor</h3>"));
        assert!(html.contains("ana@example.com"));
    }

    #[test]
    fn test_spanish_dates() {
        let jan = Utc.with_ymd_and_hms(2025, 1, 3, 0, 0, 0).unwrap();
        assert_eq!(spanish_long_date(jan), "3 de enero de 2025");
        let dec = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 0).unwrap();
        assert_eq!(spanish_long_date(dec), "31 de diciembre de 2025");
    }
}
