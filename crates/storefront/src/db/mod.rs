//! Database operations for the storefront `PostgreSQL` database.
//!
//! # Schema: `store`
//!
//! - `user` - Login accounts (argon2 password hashes)
//! - `customer` - Shopper profile, one per user
//! - `category`, `product`, `gallery` - Catalog
//! - `review`, `favourite_product` - Per-user product data
//! - `order`, `order_product`, `shipping_address` - Carts and checkouts
//!
//! Sessions live in the `tower_sessions` schema managed by
//! `tower-sessions-sqlx-store`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p bozor-cli -- migrate
//! ```
//!
//! Queries are built at runtime with `sqlx::query_as` and typed row structs,
//! so the crate compiles without a live database.

pub mod categories;
pub mod customers;
pub mod deletion;
pub mod favourites;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use bozor_core::{Price, Slug};

pub use categories::CategoryRepository;
pub use customers::CustomerRepository;
pub use deletion::{DeletionReport, delete_entity};
pub use favourites::FavouriteRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use reviews::ReviewRepository;
pub use users::UserRepository;

/// Errors returned by repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value failed domain validation.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    #[error("not found")]
    NotFound,

    /// A unique constraint was violated; the payload names what collided.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique violation to [`RepositoryError::Conflict`], naming the
/// violated constraint when the driver reports one.
pub(crate) fn map_unique_violation(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        let what = db_err.constraint().unwrap_or("unique constraint").to_owned();
        return RepositoryError::Conflict(what);
    }
    RepositoryError::Database(e)
}

pub(crate) fn parse_slug(raw: Option<String>) -> Result<Option<Slug>, RepositoryError> {
    raw.filter(|s| !s.is_empty())
        .map(|s| {
            Slug::parse(&s)
                .map_err(|e| RepositoryError::DataCorruption(format!("invalid slug '{s}': {e}")))
        })
        .transpose()
}

pub(crate) fn parse_price(raw: f64) -> Result<Price, RepositoryError> {
    Price::new(raw)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid price {raw}: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slug() {
        assert_eq!(parse_slug(None).unwrap(), None);
        assert_eq!(parse_slug(Some(String::new())).unwrap(), None);
        assert_eq!(
            parse_slug(Some("uzuklar".to_string())).unwrap(),
            Some(Slug::parse("uzuklar").unwrap())
        );
        assert!(matches!(
            parse_slug(Some("bad slug".to_string())),
            Err(RepositoryError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_parse_price() {
        assert!(parse_price(12.5).is_ok());
        assert!(matches!(
            parse_price(-1.0),
            Err(RepositoryError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_non_database_errors_are_not_conflicts() {
        assert!(matches!(
            map_unique_violation(sqlx::Error::RowNotFound),
            RepositoryError::Database(_)
        ));
    }
}
