//! User repository.
//!
//! Registration creates the user and its customer profile in one transaction.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use bozor_core::{CustomerId, Email, UserId};

use super::{RepositoryError, map_unique_violation};
use super::customers::CustomerRow;
use crate::models::{Customer, User};

const USER_COLUMNS: &str = "id, username, first_name, last_name, email, created_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    username: String,
    first_name: String,
    last_name: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        Ok(Self {
            id: row.id,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            email,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// Fields for a new account. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub password_hash: String,
}

/// Which unique field a registration collided on.
fn conflict_field(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some(c) if c.contains("email") => "email",
        _ => "username",
    }
}

/// Replace a constraint name in a `Conflict` with the form field it guards.
fn name_conflicting_field(e: RepositoryError) -> RepositoryError {
    match e {
        RepositoryError::Conflict(constraint) => {
            RepositoryError::Conflict(conflict_field(Some(&constraint)).to_owned())
        }
        other => other,
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    #[instrument(skip(self))]
    pub async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM store.user WHERE id = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    #[instrument(skip(self))]
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM store.user WHERE username = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .fetch_optional(self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    /// A user and their password hash, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored email is invalid.
    #[instrument(skip(self))]
    pub async fn get_password_hash(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS}, password_hash FROM store.user WHERE username = $1");
        let Some(row) = sqlx::query_as::<_, UserWithHashRow>(&sql)
            .bind(username)
            .fetch_optional(self.pool)
            .await?
        else {
            return Ok(None);
        };
        Ok(Some((User::try_from(row.user)?, row.password_hash)))
    }

    /// Create a user and its customer profile.
    ///
    /// The customer copies the user's first and last name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict("username" | "email")` if either is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, new_user), fields(username = %new_user.username))]
    pub async fn create_with_customer(
        &self,
        new_user: &NewUser,
    ) -> Result<(User, Customer), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO store.user (username, first_name, last_name, email, password_hash) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&new_user.username)
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .bind(new_user.email.as_str())
            .bind(&new_user.password_hash)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_unique_violation)
            .map_err(name_conflicting_field)?;
        let user = User::try_from(row)?;

        let customer = sqlx::query_as::<_, CustomerRow>(
            r"
            INSERT INTO store.customer (user_id, first_name, last_name)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, first_name, last_name
            ",
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((user, customer.into()))
    }

    /// Customer id linked to a user, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn customer_id(&self, user: UserId) -> Result<Option<CustomerId>, RepositoryError> {
        let id = sqlx::query_scalar::<_, CustomerId>(
            "SELECT id FROM store.customer WHERE user_id = $1",
        )
        .bind(user)
        .fetch_optional(self.pool)
        .await?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_field() {
        assert_eq!(conflict_field(Some("user_email_key")), "email");
        assert_eq!(conflict_field(Some("user_username_key")), "username");
        assert_eq!(conflict_field(None), "username");
    }

    #[test]
    fn test_name_conflicting_field() {
        let named = |constraint: &str| {
            match name_conflicting_field(RepositoryError::Conflict(constraint.to_owned())) {
                RepositoryError::Conflict(field) => field,
                other => panic!("unexpected {other:?}"),
            }
        };
        assert_eq!(named("user_email_lower_key"), "email");
        assert_eq!(named("user_username_key"), "username");
        assert_eq!(named("unique constraint"), "username");
        assert!(matches!(
            name_conflicting_field(RepositoryError::NotFound),
            RepositoryError::NotFound
        ));
    }
}
