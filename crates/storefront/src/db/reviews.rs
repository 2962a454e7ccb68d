//! Review repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use bozor_core::{ProductId, ReviewId, UserId};

use super::RepositoryError;
use crate::models::{Review, ReviewWithAuthor};

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: ReviewId,
    text: String,
    author_id: UserId,
    product_id: ProductId,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            text: row.text,
            author_id: row.author_id,
            product_id: row.product_id,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ReviewWithAuthorRow {
    #[sqlx(flatten)]
    review: ReviewRow,
    username: String,
}

/// Repository for review database operations.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reviews for a product with their authors, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_for_product(
        &self,
        product: ProductId,
    ) -> Result<Vec<ReviewWithAuthor>, RepositoryError> {
        let rows = sqlx::query_as::<_, ReviewWithAuthorRow>(
            r"
            SELECT r.id, r.text, r.author_id, r.product_id, r.created_at, u.username
            FROM store.review r
            JOIN store.user u ON u.id = r.author_id
            WHERE r.product_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            ",
        )
        .bind(product)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| ReviewWithAuthor {
                review: row.review.into(),
                author: row.username,
            })
            .collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the author or product does not
    /// exist or the insert fails.
    #[instrument(skip(self, text))]
    pub async fn create(
        &self,
        author: UserId,
        product: ProductId,
        text: &str,
    ) -> Result<Review, RepositoryError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r"
            INSERT INTO store.review (text, author_id, product_id)
            VALUES ($1, $2, $3)
            RETURNING id, text, author_id, product_id, created_at
            ",
        )
        .bind(text)
        .bind(author)
        .bind(product)
        .fetch_one(self.pool)
        .await?;
        Ok(row.into())
    }
}
