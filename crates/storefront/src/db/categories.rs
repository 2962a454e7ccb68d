//! Category repository.

use sqlx::PgPool;
use tracing::instrument;

use bozor_core::{CategoryId, Slug};

use super::{RepositoryError, map_unique_violation, parse_slug};
use crate::models::Category;

const CATEGORY_COLUMNS: &str = "id, title, image, slug, parent_id";

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    title: String,
    image: Option<String>,
    slug: Option<String>,
    parent_id: Option<CategoryId>,
}

impl TryFrom<CategoryRow> for Category {
    type Error = RepositoryError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            image: row.image.filter(|path| !path.is_empty()),
            slug: parse_slug(row.slug)?,
            parent_id: row.parent_id,
        })
    }
}

/// Fields for inserting a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub title: String,
    pub image: Option<String>,
    pub slug: Option<Slug>,
    pub parent_id: Option<CategoryId>,
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Categories without a parent, in creation order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn top_level(&self) -> Result<Vec<Category>, RepositoryError> {
        let sql = format!(
            "SELECT {CATEGORY_COLUMNS} FROM store.category WHERE parent_id IS NULL ORDER BY id"
        );
        let rows = sqlx::query_as::<_, CategoryRow>(&sql)
            .fetch_all(self.pool)
            .await?;
        rows.into_iter().map(Category::try_from).collect()
    }

    /// Direct children of `parent`, in creation order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn subcategories(
        &self,
        parent: CategoryId,
    ) -> Result<Vec<Category>, RepositoryError> {
        let sql =
            format!("SELECT {CATEGORY_COLUMNS} FROM store.category WHERE parent_id = $1 ORDER BY id");
        let rows = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(parent)
            .fetch_all(self.pool)
            .await?;
        rows.into_iter().map(Category::try_from).collect()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM store.category WHERE id = $1");
        sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .map(Category::try_from)
            .transpose()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_by_slug(&self, slug: &Slug) -> Result<Option<Category>, RepositoryError> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM store.category WHERE slug = $1");
        sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(slug.as_str())
            .fetch_optional(self.pool)
            .await?
            .map(Category::try_from)
            .transpose()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, category), fields(title = %category.title))]
    pub async fn create(&self, category: &NewCategory) -> Result<Category, RepositoryError> {
        let sql = format!(
            "INSERT INTO store.category (title, image, slug, parent_id) \
             VALUES ($1, $2, $3, $4) RETURNING {CATEGORY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(&category.title)
            .bind(category.image.as_deref())
            .bind(category.slug.as_ref().map(Slug::as_str))
            .bind(category.parent_id)
            .fetch_one(self.pool)
            .await
            .map_err(map_unique_violation)?;
        Category::try_from(row)
    }
}
