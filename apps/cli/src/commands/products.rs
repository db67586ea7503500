//! # Product Commands
//!
//! Catalog listing for every signed-in user; adding products and setting
//! units for administrators.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::state::SessionState;
use colva_core::validation::{validate_price_cents, validate_product_name, validate_units};
use colva_core::{Money, NewProduct, Product};
use colva_db::Backend;

/// A product as shown to the user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: i64,
    pub name: String,
    pub units: i64,
    pub unit_cost_cents: i64,
    /// `$223.076,00`
    pub unit_cost_display: String,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        ProductDto {
            unit_cost_display: p.unit_cost().to_string(),
            id: p.id,
            name: p.name,
            units: p.units,
            unit_cost_cents: p.unit_cost_cents,
        }
    }
}

pub async fn list_products(
    backend: &dyn Backend,
    _session: &SessionState,
) -> ApiResult<Vec<ProductDto>> {
    debug!("list_products command");
    let products = backend.list_products().await?;
    Ok(products.into_iter().map(ProductDto::from).collect())
}

/// Adds a product. `unit_cost` is a plain decimal (`"223076.00"`).
pub async fn add_product(
    backend: &dyn Backend,
    session: &SessionState,
    name: &str,
    units: i64,
    unit_cost: &str,
) -> ApiResult<ProductDto> {
    session.require_admin()?;

    validate_product_name(name)?;
    validate_units(units)?;
    let unit_cost: Money = unit_cost.parse()?;
    validate_price_cents(unit_cost.cents())?;

    let product = backend
        .insert_product(&NewProduct {
            name: name.trim().to_string(),
            units,
            unit_cost_cents: unit_cost.cents(),
        })
        .await?;

    info!(id = product.id, name = %product.name, "Product added");
    Ok(product.into())
}

/// Sets the units of a product by name. Negative counts are stored as 0.
pub async fn set_units(
    backend: &dyn Backend,
    session: &SessionState,
    name: &str,
    units: i64,
) -> ApiResult<ProductDto> {
    session.require_admin()?;
    if name.trim().is_empty() {
        return Err(ApiError::validation("name is required"));
    }

    let product = backend.set_product_units(name, units).await?;
    info!(name = %product.name, units = product.units, "Units updated");
    Ok(product.into())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockCheck {
    pub name: String,
    pub requested: i64,
    pub available: bool,
}

/// Whether `quantity` units of the named product are in stock.
pub async fn check_stock(
    backend: &dyn Backend,
    _session: &SessionState,
    name: &str,
    quantity: i64,
) -> ApiResult<StockCheck> {
    if quantity <= 0 {
        return Err(ApiError::validation("quantity must be positive"));
    }

    let available = backend.check_stock(name, quantity).await?;
    Ok(StockCheck {
        name: name.trim().to_string(),
        requested: quantity,
        available,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use colva_core::{Role, UserProfile};
    use colva_db::{seed_defaults, MemoryBackend};

    fn session(role: Role) -> SessionState {
        SessionState::new(UserProfile {
            id: 1,
            username: "tester".into(),
            role,
        })
    }

    #[tokio::test]
    async fn test_list_shows_formatted_prices() {
        let backend = MemoryBackend::new();
        seed_defaults(&backend).await.unwrap();

        let products = list_products(&backend, &session(Role::Client)).await.unwrap();
        assert_eq!(products.len(), 3);
        assert_eq!(products[0].name, "Control Remoto Universal");
        assert_eq!(products[0].unit_cost_display, "$91.636,00");
    }

    #[tokio::test]
    async fn test_add_product_trims_and_rejects_duplicates() {
        let backend = MemoryBackend::new();
        let admin = session(Role::Admin);

        let added = add_product(&backend, &admin, "  Sensor de Movimiento ", 12, "45990.50")
            .await
            .unwrap();
        assert_eq!(added.name, "Sensor de Movimiento");
        assert_eq!(added.unit_cost_cents, 4_599_050);

        let dup = add_product(&backend, &admin, "Sensor de Movimiento", 1, "1")
            .await
            .unwrap_err();
        assert_eq!(dup.message, "A product with that name already exists");
    }

    #[tokio::test]
    async fn test_add_product_validates_before_store() {
        let backend = MemoryBackend::new();
        let admin = session(Role::Admin);

        assert!(add_product(&backend, &admin, "", 1, "10").await.is_err());
        assert!(add_product(&backend, &admin, "Foco", -1, "10").await.is_err());
        assert!(add_product(&backend, &admin, "Foco", 1, "diez").await.is_err());
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_catalog_changes_are_admin_only() {
        let backend = MemoryBackend::new();
        seed_defaults(&backend).await.unwrap();

        let err = set_units(&backend, &session(Role::Client), "Control Remoto Universal", 3)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn test_set_units_and_check_stock() {
        let backend = MemoryBackend::new();
        seed_defaults(&backend).await.unwrap();
        let admin = session(Role::Admin);

        let updated = set_units(&backend, &admin, "Foco LED RGB Controlado", -5)
            .await
            .unwrap();
        assert_eq!(updated.units, 0);

        let check = check_stock(&backend, &admin, "Foco LED RGB Controlado", 1)
            .await
            .unwrap();
        assert!(!check.available);

        let missing = check_stock(&backend, &admin, "Nevera", 1).await.unwrap_err();
        assert_eq!(missing.code, ErrorCode::NotFound);
    }
}
