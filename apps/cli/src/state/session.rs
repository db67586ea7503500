//! # Session State
//!
//! The signed-in user, passed explicitly to every command that needs one.
//!
//! ## Lifecycle
//! ```text
//! login ──► SessionState::new(profile) ──► SessionStore::save ──► session.json
//!                                                                      │
//! next run ◄── SessionStore::load ◄────────────────────────────────────┘
//!
//! logout ──► SessionStore::clear (file removed)
//! ```
//!
//! The snapshot holds the profile only (id, username, role) plus the last
//! document path; the password hash never reaches disk here.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use colva_core::{Role, UserProfile};

/// A signed-in user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub user: UserProfile,
    pub signed_in_at: DateTime<Utc>,
    /// Last document generated in this session.
    #[serde(default)]
    pub last_document: Option<PathBuf>,
}

impl SessionState {
    pub fn new(user: UserProfile) -> Self {
        SessionState {
            user,
            signed_in_at: Utc::now(),
            last_document: None,
        }
    }

    pub fn user_id(&self) -> i64 {
        self.user.id
    }

    pub fn is_admin(&self) -> bool {
        self.user.role == Role::Admin
    }

    /// Fails with `Forbidden` unless the user is an administrator.
    pub fn require_admin(&self) -> ApiResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden(
                "This action requires an administrator account",
            ))
        }
    }
}

/// JSON file holding the current session between runs.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SessionStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached session, if any. An unreadable snapshot counts as signed out.
    pub fn load(&self) -> Option<SessionState> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => {
                debug!(path = %self.path.display(), "No cached session");
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ignoring corrupt session file");
                None
            }
        }
    }

    pub fn save(&self, session: &SessionState) -> ApiResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    ApiError::internal(format!("Could not create session folder: {}", e))
                })?;
            }
        }

        let json = serde_json::to_string_pretty(session)
            .map_err(|e| ApiError::internal(format!("Could not encode session: {}", e)))?;
        fs::write(&self.path, json)
            .map_err(|e| ApiError::internal(format!("Could not save session: {}", e)))?;

        debug!(user_id = session.user.id, "Session saved");
        Ok(())
    }

    /// Removes the snapshot. Returns whether one existed.
    pub fn clear(&self) -> ApiResult<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ApiError::internal(format!("Could not remove session: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(role: Role) -> UserProfile {
        UserProfile {
            id: 1072649746,
            username: "admin".to_string(),
            role,
        }
    }

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("state/session.json"));
        assert!(store.load().is_none());

        let session = SessionState::new(profile(Role::Admin));
        store.save(&session).unwrap();
        assert_eq!(store.load(), Some(session));

        assert!(store.clear().unwrap());
        assert!(!store.clear().unwrap());
        assert!(store.load().is_none());
    }

    #[test]
    fn test_snapshot_has_no_password_material() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.save(&SessionState::new(profile(Role::Client))).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(!raw.to_lowercase().contains("password"));
        assert!(raw.contains("\"username\": \"admin\""));
    }

    #[test]
    fn test_corrupt_snapshot_is_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn test_require_admin() {
        assert!(SessionState::new(profile(Role::Admin)).require_admin().is_ok());
        let err = SessionState::new(profile(Role::Client))
            .require_admin()
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::Forbidden);
    }
}
