//! Favourite product repository.
//!
//! The table does not enforce one row per `(user, product)`; [`add`] checks
//! before inserting so the storefront never creates duplicates itself.
//!
//! [`add`]: FavouriteRepository::add

use sqlx::PgPool;
use tracing::instrument;

use bozor_core::{ProductId, UserId};

use super::RepositoryError;
use super::products::{PRODUCT_COLUMNS, ProductRow};
use crate::models::Product;

/// Repository for favourite product database operations.
pub struct FavouriteRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FavouriteRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Products the user has favourited, oldest bookmark first.
    ///
    /// Yields one product per favourite row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn products_for_user(&self, user: UserId) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM store.favourite_product f \
             JOIN store.product p ON p.id = f.product_id \
             WHERE f.user_id = $1 ORDER BY f.id"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(user)
            .fetch_all(self.pool)
            .await?;
        rows.into_iter().map(Product::try_from).collect()
    }

    /// Product ids the user has favourited.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_ids_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<ProductId>, RepositoryError> {
        let ids = sqlx::query_scalar::<_, ProductId>(
            "SELECT DISTINCT product_id FROM store.favourite_product WHERE user_id = $1",
        )
        .bind(user)
        .fetch_all(self.pool)
        .await?;
        Ok(ids)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_favourite(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM store.favourite_product \
             WHERE user_id = $1 AND product_id = $2)",
        )
        .bind(user)
        .bind(product)
        .fetch_one(self.pool)
        .await?;
        Ok(exists)
    }

    /// Bookmark a product. Returns `false` if it was already bookmarked.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the product does not exist or
    /// the insert fails.
    #[instrument(skip(self))]
    pub async fn add(&self, user: UserId, product: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO store.favourite_product (user_id, product_id)
            SELECT $1, $2
            WHERE NOT EXISTS (
                SELECT 1 FROM store.favourite_product WHERE user_id = $1 AND product_id = $2
            )
            ",
        )
        .bind(user)
        .bind(product)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove every bookmark of `product` by `user`. Returns rows removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn remove(&self, user: UserId, product: ProductId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM store.favourite_product WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user)
        .bind(product)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Flip the bookmark. Returns whether the product is now a favourite.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn toggle(&self, user: UserId, product: ProductId) -> Result<bool, RepositoryError> {
        if self.remove(user, product).await? > 0 {
            return Ok(false);
        }
        self.add(user, product).await?;
        Ok(true)
    }
}
