//! # Quotation Repository
//!
//! Database operations for quotations and their line items.
//!
//! ## Atomic Creation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create(new_quotation)                                                  │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    for each product (ascending id, so concurrent writers lock in the    │
//! │    same order):                                                         │
//! │      UPDATE products SET units = units - q WHERE id = p AND units >= q  │
//! │      0 rows? ──► ROLLBACK, InsufficientStock / NotFound                 │
//! │                                                                         │
//! │    INSERT INTO quotations (...) RETURNING *        ← header             │
//! │    INSERT INTO quotation_items VALUES (...), (...) ← all items at once  │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction, which rolls back:       │
//! │  no header without items, no stock taken without a quotation.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use colva_core::{ClientInfo, DocumentType, LineItemDetail, NewQuotation, Quotation};

const QUOTATION_COLUMNS: &str = "id, user_id, client_document_type, client_document_number, \
     client_names, client_surnames, client_phone, client_email, \
     subtotal_cents, tax_cents, total_cents, created_at";

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct QuotationRow {
    pub id: i64,
    pub user_id: i64,
    pub client_document_type: String,
    pub client_document_number: String,
    pub client_names: String,
    pub client_surnames: String,
    pub client_phone: String,
    pub client_email: Option<String>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<QuotationRow> for Quotation {
    type Error = DbError;

    fn try_from(row: QuotationRow) -> Result<Self, Self::Error> {
        let document_type: DocumentType = row.client_document_type.parse().map_err(|_| {
            DbError::Internal(format!(
                "quotation {} has unknown document type '{}'",
                row.id, row.client_document_type
            ))
        })?;

        Ok(Quotation {
            id: row.id,
            user_id: row.user_id,
            client: ClientInfo {
                document_type,
                document_number: row.client_document_number,
                names: row.client_names,
                surnames: row.client_surnames,
                phone: row.client_phone,
                email: row.client_email,
            },
            subtotal_cents: row.subtotal_cents,
            tax_cents: row.tax_cents,
            total_cents: row.total_cents,
            created_at: row.created_at,
        })
    }
}

/// Repository for quotation database operations.
#[derive(Debug, Clone)]
pub struct QuotationRepository {
    pool: PgPool,
}

impl QuotationRepository {
    pub fn new(pool: PgPool) -> Self {
        QuotationRepository { pool }
    }

    /// Writes header, items and stock decrements in one transaction.
    ///
    /// ## Returns
    /// * `Ok(Quotation)` - committed header
    /// * `Err(DbError::InvalidInput)` - no items
    /// * `Err(DbError::InsufficientStock)` - stock moved since the last check
    /// * `Err(DbError::NotFound)` - a product disappeared
    pub async fn create(&self, new: &NewQuotation) -> DbResult<Quotation> {
        if new.items.is_empty() {
            return Err(DbError::InvalidInput("quotation has no items".to_string()));
        }

        let mut demand = new
            .quantities_by_product()
            .map_err(|e| DbError::InvalidInput(e.to_string()))?;
        demand.sort_by_key(|(product_id, _)| *product_id);

        debug!(user_id = new.user_id, items = new.items.len(), "Creating quotation");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        for (product_id, requested) in demand {
            let result = sqlx::query(
                r#"
                UPDATE products
                SET units = units - $2, updated_at = now()
                WHERE id = $1 AND units >= $2
                "#,
            )
            .bind(product_id)
            .bind(requested)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let available: Option<i64> =
                    sqlx::query_scalar("SELECT units FROM products WHERE id = $1")
                        .bind(product_id)
                        .fetch_optional(&mut *tx)
                        .await?;

                warn!(product_id, requested, ?available, "Stock check failed at write time");
                return Err(match available {
                    Some(available) => DbError::InsufficientStock {
                        product_id,
                        available,
                        requested,
                    },
                    None => DbError::not_found("Product", product_id),
                });
            }
        }

        let client = &new.client;
        let row = sqlx::query_as::<_, QuotationRow>(&format!(
            r#"
            INSERT INTO quotations (
                user_id, client_document_type, client_document_number,
                client_names, client_surnames, client_phone, client_email,
                subtotal_cents, tax_cents, total_cents
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            QUOTATION_COLUMNS
        ))
        .bind(new.user_id)
        .bind(client.document_type.code())
        .bind(&client.document_number)
        .bind(&client.names)
        .bind(&client.surnames)
        .bind(&client.phone)
        .bind(client.email.as_deref())
        .bind(new.amounts.subtotal.cents())
        .bind(new.amounts.tax.cents())
        .bind(new.amounts.total.cents())
        .fetch_one(&mut *tx)
        .await?;

        let mut items = QueryBuilder::<Postgres>::new(
            "INSERT INTO quotation_items (quotation_id, environment, product_id, quantity, unit_price_cents) ",
        );
        items.push_values(&new.items, |mut b, item| {
            b.push_bind(row.id)
                .push_bind(&item.environment)
                .push_bind(item.product_id)
                .push_bind(item.quantity)
                .push_bind(item.unit_price_cents);
        });
        items.build().execute(&mut *tx).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(quotation_id = row.id, user_id = new.user_id, "Quotation created");
        Quotation::try_from(row)
    }

    /// Quotations authored by `user_id`, newest first.
    pub async fn list_for_user(&self, user_id: i64) -> DbResult<Vec<Quotation>> {
        let rows = sqlx::query_as::<_, QuotationRow>(&format!(
            "SELECT {} FROM quotations WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
            QUOTATION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(user_id, count = rows.len(), "Listed quotations");
        rows.into_iter().map(Quotation::try_from).collect()
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<Quotation>> {
        let row = sqlx::query_as::<_, QuotationRow>(&format!(
            "SELECT {} FROM quotations WHERE id = $1",
            QUOTATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Quotation::try_from).transpose()
    }

    /// Items of a quotation joined with the product's current name.
    pub async fn items(&self, quotation_id: i64) -> DbResult<Vec<LineItemDetail>> {
        let items = sqlx::query_as::<_, LineItemDetail>(
            r#"
            SELECT
                qi.id,
                qi.quotation_id,
                qi.environment,
                qi.product_id,
                p.name AS product_name,
                qi.quantity,
                qi.unit_price_cents
            FROM quotation_items qi
            LEFT JOIN products p ON p.id = qi.product_id
            WHERE qi.quotation_id = $1
            ORDER BY qi.id
            "#,
        )
        .bind(quotation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use colva_core::pricing::Amounts;
    use colva_core::{Money, NewLineItem, NewProduct, NewUser, Role, TaxRate};

    /// Needs a live server: `COLVA_TEST_DATABASE_URL=postgres://... cargo test -- --ignored`
    async fn live() -> Database {
        let url = std::env::var("COLVA_TEST_DATABASE_URL").unwrap();
        Database::new(DbConfig::new(url)).await.unwrap()
    }

    fn quotation_for(user_id: i64, product_id: i64, quantity: i64) -> NewQuotation {
        let subtotal = Money::from_cents(10_000 * quantity);
        let tax = subtotal.calculate_tax(TaxRate::default());
        NewQuotation {
            user_id,
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
                product_id,
                product_name: "Lamp".into(),
                quantity,
                unit_price_cents: 10_000,
            }],
        }
    }

    #[tokio::test]
    #[ignore]
    async fn test_create_is_atomic_with_stock() {
        let db = live().await;
        let suffix = Utc::now().timestamp_millis();

        let user = db
            .users()
            .insert(&NewUser {
                id: suffix,
                username: format!("it-{}", suffix),
                password_hash: "x".into(),
                role: Role::Client,
            })
            .await
            .unwrap();
        let lamp = db
            .products()
            .insert(&NewProduct {
                name: format!("Lamp {}", suffix),
                units: 10,
                unit_cost_cents: 10_000,
            })
            .await
            .unwrap();

        let saved = db
            .quotations()
            .create(&quotation_for(user.id, lamp.id, 6))
            .await
            .unwrap();
        assert_eq!(db.quotations().items(saved.id).await.unwrap().len(), 1);
        assert_eq!(db.products().get(lamp.id).await.unwrap().unwrap().units, 4);

        let err = db
            .quotations()
            .create(&quotation_for(user.id, lamp.id, 5))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InsufficientStock { available: 4, .. }));
        assert_eq!(db.quotations().list_for_user(user.id).await.unwrap().len(), 1);
        assert_eq!(db.products().get(lamp.id).await.unwrap().unwrap().units, 4);

        db.close().await;
    }
}
