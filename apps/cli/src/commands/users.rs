//! # User Administration Commands
//!
//! Admin only. Rules beyond the store's own constraints:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  target is admin  ──► role change rejected (role is immutable)   │
//! │                   ──► delete rejected (store guard)              │
//! │  new username     ──► trimmed, ≤ 50 chars, unique                │
//! │  new password     ──► ≥ 6 chars, stored as an Argon2 hash        │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::state::SessionState;
use colva_core::validation::{validate_password, validate_username};
use colva_core::{Role, UserProfile, UserUpdate};
use colva_db::{hash_password, Backend};

/// Requested changes, as typed by the administrator.
#[derive(Debug, Clone, Default)]
pub struct UserUpdateRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

pub async fn list_users(
    backend: &dyn Backend,
    session: &SessionState,
) -> ApiResult<Vec<UserProfile>> {
    session.require_admin()?;
    debug!("list_users command");

    let users = backend.list_users().await?;
    Ok(users.iter().map(|u| u.profile()).collect())
}

pub async fn get_user(
    backend: &dyn Backend,
    session: &SessionState,
    id: i64,
) -> ApiResult<UserProfile> {
    session.require_admin()?;

    backend
        .get_user(id)
        .await?
        .map(|u| u.profile())
        .ok_or_else(|| ApiError::not_found("User", &id.to_string()))
}

pub async fn update_user(
    backend: &dyn Backend,
    session: &SessionState,
    id: i64,
    request: &UserUpdateRequest,
) -> ApiResult<UserProfile> {
    session.require_admin()?;
    debug!(id, "update_user command");

    let mut update = UserUpdate::default();

    if let Some(username) = &request.username {
        validate_username(username)?;
        update.username = Some(username.trim().to_string());
    }
    if let Some(password) = &request.password {
        validate_password(password)?;
        update.password_hash = Some(hash_password(password)?);
    }
    if let Some(role) = &request.role {
        update.role = Some(role.parse::<Role>()?);
    }

    if update.is_empty() {
        return Err(ApiError::validation("Nothing to update"));
    }

    let target = backend
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", &id.to_string()))?;

    if target.role.is_admin() && update.role.is_some_and(|r| r != Role::Admin) {
        return Err(ApiError::forbidden(
            "The administrator role cannot be changed",
        ));
    }

    let updated = backend.update_user(id, &update).await?;
    info!(id, by = session.user_id(), "User updated");
    Ok(updated.profile())
}

pub async fn delete_user(
    backend: &dyn Backend,
    session: &SessionState,
    id: i64,
) -> ApiResult<()> {
    session.require_admin()?;
    debug!(id, "delete_user command");

    backend.delete_user(id).await?;
    info!(id, by = session.user_id(), "User deleted");
    Ok(())
}
