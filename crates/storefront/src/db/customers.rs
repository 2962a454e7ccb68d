//! Customer repository.

use sqlx::PgPool;
use tracing::instrument;

use bozor_core::{CustomerId, UserId};

use super::RepositoryError;
use crate::models::{Customer, User};

const CUSTOMER_COLUMNS: &str = "id, user_id, first_name, last_name";

#[derive(sqlx::FromRow)]
pub(crate) struct CustomerRow {
    id: CustomerId,
    user_id: Option<UserId>,
    first_name: String,
    last_name: String,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            first_name: row.first_name,
            last_name: row.last_name,
        }
    }
}

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_by_user(&self, user: UserId) -> Result<Option<Customer>, RepositoryError> {
        let sql = format!("SELECT {CUSTOMER_COLUMNS} FROM store.customer WHERE user_id = $1");
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(user)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Customer::from))
    }

    /// The user's customer profile, created from their account names if
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn get_or_create_for_user(&self, user: &User) -> Result<Customer, RepositoryError> {
        let sql = format!(
            "INSERT INTO store.customer (user_id, first_name, last_name) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
             RETURNING {CUSTOMER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(user.id)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .fetch_one(self.pool)
            .await?;
        Ok(row.into())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn update_names(
        &self,
        id: CustomerId,
        first_name: &str,
        last_name: &str,
    ) -> Result<Customer, RepositoryError> {
        let sql = format!(
            "UPDATE store.customer SET first_name = $2, last_name = $3 WHERE id = $1 \
             RETURNING {CUSTOMER_COLUMNS}"
        );
        sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(id)
            .bind(first_name)
            .bind(last_name)
            .fetch_optional(self.pool)
            .await?
            .map(Customer::from)
            .ok_or(RepositoryError::NotFound)
    }
}
