//! # Authentication Commands
//!
//! Sign-in by identification number and password, sign-out, registration.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::state::{SessionState, SessionStore};
use colva_core::validation::{parse_user_id, validate_registration, RegistrationForm};
use colva_core::{NewUser, Role, UserProfile};
use colva_db::{hash_password, verify_password, Backend};

/// Checks credentials and opens a session.
///
/// Unknown identification numbers and wrong passwords get distinct
/// messages.
pub async fn login(backend: &dyn Backend, id: &str, password: &str) -> ApiResult<SessionState> {
    let id = parse_user_id(id)?;
    if password.is_empty() {
        return Err(ApiError::validation("password is required"));
    }
    debug!(id, "login command");

    let user = backend
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("No user is registered with that identification number"))?;

    if !verify_password(password, &user.password_hash) {
        warn!(id, "Rejected sign-in: wrong password");
        return Err(ApiError::unauthorized("Incorrect password"));
    }

    info!(id, role = %user.role, "User signed in");
    Ok(SessionState::new(user.profile()))
}

/// Closes the cached session. Returns whether one was open.
pub fn logout(store: &SessionStore) -> ApiResult<bool> {
    let cleared = store.clear()?;
    if cleared {
        info!("User signed out");
    }
    Ok(cleared)
}

/// Session restored from the previous run, if any.
///
/// The snapshot only names the user; the profile (and so the role) is
/// re-read from the store. A snapshot whose user no longer exists is
/// removed and counts as signed out.
pub async fn restore_session(
    backend: &dyn Backend,
    store: &SessionStore,
) -> ApiResult<Option<SessionState>> {
    let Some(mut session) = store.load() else {
        return Ok(None);
    };

    let Some(user) = backend.get_user(session.user_id()).await? else {
        warn!(user_id = session.user_id(), "Cached session user no longer exists");
        store.clear()?;
        return Ok(None);
    };

    let profile = user.profile();
    if profile != session.user {
        warn!(
            user_id = profile.id,
            cached_role = %session.user.role,
            role = %profile.role,
            "Cached session differs from the store, using the stored profile"
        );
        session.user = profile;
        store.save(&session)?;
    }

    debug!(user_id = session.user.id, "Session restored");
    Ok(Some(session))
}

/// Fails with `Unauthorized` when nobody is signed in.
pub fn require_session(session: Option<&SessionState>) -> ApiResult<&SessionState> {
    session.ok_or_else(|| ApiError::unauthorized("Sign in first (colva login)"))
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub user: UserProfile,
}

/// Creates a `client` account.
///
/// Taken identification numbers and usernames are reported before the
/// insert; the unique constraints still catch a concurrent registration.
pub async fn register(
    backend: &dyn Backend,
    form: &RegistrationForm,
) -> ApiResult<RegistrationResponse> {
    let registration = validate_registration(form)?;
    debug!(id = registration.id, "register command");

    if backend.get_user(registration.id).await?.is_some() {
        return Err(ApiError::validation(
            "A user with that identification number is already registered",
        ));
    }
    if backend
        .find_user_by_username(&registration.username)
        .await?
        .is_some()
    {
        return Err(ApiError::validation("That username is already taken"));
    }

    let user = backend
        .insert_user(&NewUser {
            id: registration.id,
            username: registration.username,
            password_hash: hash_password(&registration.password)?,
            role: Role::Client,
        })
        .await?;

    info!(id = user.id, "User registered");
    Ok(RegistrationResponse {
        user: user.profile(),
    })
}
