//! # User Repository
//!
//! Database operations for users.
//!
//! Roles are stored as text guarded by `users_role_check`; rows are read
//! into [`UserRow`] and converted, so an unexpected role string surfaces as
//! an error instead of a panic.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use colva_core::{NewUser, Role, User, UserUpdate};

const USER_COLUMNS: &str = "id, username, password, role, created_at";

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DbError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|_| DbError::Internal(format!("user {} has unknown role '{}'", row.id, row.role)))?;

        Ok(User {
            id: row.id,
            username: row.username,
            password_hash: row.password,
            role,
            created_at: row.created_at,
        })
    }
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        UserRepository { pool }
    }

    /// Gets a user by identification number.
    pub async fn get(&self, id: i64) -> DbResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// All users ordered by username.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users ORDER BY username",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed users");
        rows.into_iter().map(User::try_from).collect()
    }

    /// Inserts a user.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - id (`users_pkey`) or username
    ///   (`users_username_key`) already taken
    /// * `Err(DbError::CheckViolation)` - role rejected (`users_role_check`)
    pub async fn insert(&self, user: &NewUser) -> DbResult<User> {
        debug!(id = user.id, username = %user.username, "Inserting user");

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (id, username, password, role) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await?;

        User::try_from(row)
    }

    /// Applies the `Some` fields of `update`.
    pub async fn update(&self, id: i64, update: &UserUpdate) -> DbResult<User> {
        debug!(id, "Updating user");

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users SET
                username = COALESCE($2, username),
                password = COALESCE($3, password),
                role = COALESCE($4, role)
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(update.username.as_deref())
        .bind(update.password_hash.as_deref())
        .bind(update.role.map(|r| r.as_str()))
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => User::try_from(row),
            None => Err(DbError::not_found("User", id)),
        }
    }

    /// Deletes a non-admin user.
    ///
    /// Admin rows never match the `DELETE`; trying to delete one reports
    /// [`DbError::NotPermitted`].
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        debug!(id, "Deleting user");

        let result = sqlx::query("DELETE FROM users WHERE id = $1 AND role <> 'admin'")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return match self.get(id).await? {
                Some(_) => Err(DbError::NotPermitted(
                    "administrator accounts cannot be deleted".to_string(),
                )),
                None => Err(DbError::not_found("User", id)),
            };
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
