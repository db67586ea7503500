//! # Default Data
//!
//! First-run content: one administrator and a starter catalog.
//!
//! ```text
//! users empty?     ──► insert admin (DEFAULT_ADMIN_ID / "admin")
//! products empty?  ──► insert DEFAULT_PRODUCTS
//! ```
//!
//! Each table is only seeded while empty, so running it again is harmless.

use tracing::info;

use crate::backend::Backend;
use crate::credentials::hash_password;
use crate::error::DbResult;
use colva_core::{NewProduct, NewUser, Role};

pub const DEFAULT_ADMIN_ID: i64 = 1_072_649_746;
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// `(name, units, unit cost in cents)`
pub const DEFAULT_PRODUCTS: &[(&str, i64, i64)] = &[
    ("Google Assistant Nest", 140, 22_307_600),
    ("Foco LED RGB Controlado", 30, 6_187_600),
    ("Control Remoto Universal", 25, 9_163_600),
];

/// What [`seed_defaults`] inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub admin_created: bool,
    pub products_created: usize,
}

/// Inserts the default admin and catalog into empty tables.
pub async fn seed_defaults(backend: &dyn Backend) -> DbResult<SeedReport> {
    let mut report = SeedReport::default();

    if backend.count_users().await? == 0 {
        backend
            .insert_user(&NewUser {
                id: DEFAULT_ADMIN_ID,
                username: DEFAULT_ADMIN_USERNAME.to_string(),
                password_hash: hash_password(DEFAULT_ADMIN_PASSWORD)?,
                role: Role::Admin,
            })
            .await?;
        report.admin_created = true;
        info!(id = DEFAULT_ADMIN_ID, "Seeded default administrator");
    }

    if backend.count_products().await? == 0 {
        for &(name, units, unit_cost_cents) in DEFAULT_PRODUCTS {
            backend
                .insert_product(&NewProduct {
                    name: name.to_string(),
                    units,
                    unit_cost_cents,
                })
                .await?;
            report.products_created += 1;
        }
        info!(count = report.products_created, "Seeded default products");
    }

    Ok(report)
}
