//! Product and gallery repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use bozor_core::media::MediaUrls;
use bozor_core::sorting::SortKey;
use bozor_core::{CategoryId, GalleryId, Price, ProductId, Slug};

use super::{RepositoryError, map_unique_violation, parse_price, parse_slug};
use crate::models::{GalleryImage, Product};

pub(crate) const PRODUCT_COLUMNS: &str = "p.id, p.title, p.price, p.created_at, p.quantity, \
     p.description, p.category_id, p.slug, p.size, p.color";

#[derive(sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: ProductId,
    title: String,
    price: f64,
    created_at: DateTime<Utc>,
    quantity: i32,
    description: String,
    category_id: CategoryId,
    slug: Option<String>,
    size: String,
    color: String,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            price: parse_price(row.price)?,
            created_at: row.created_at,
            quantity: row.quantity,
            description: row.description,
            category_id: row.category_id,
            slug: parse_slug(row.slug)?,
            size: row.size,
            color: row.color,
        })
    }
}

#[derive(sqlx::FromRow)]
struct GalleryRow {
    id: GalleryId,
    image: String,
    product_id: ProductId,
}

impl From<GalleryRow> for GalleryImage {
    fn from(row: GalleryRow) -> Self {
        Self {
            id: row.id,
            image: row.image,
            product_id: row.product_id,
        }
    }
}

/// Fields for inserting a product. `None` description or color takes the
/// column default.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub title: String,
    pub price: Price,
    pub quantity: i32,
    pub description: Option<String>,
    pub category_id: CategoryId,
    pub slug: Option<Slug>,
    pub size: String,
    pub color: Option<String>,
}

/// `ORDER BY` clause for a product listing. Without a key, newest first.
fn order_by(sort: Option<SortKey>) -> String {
    match sort {
        Some(key) => format!(
            "ORDER BY p.{} {}, p.id",
            key.field.column(),
            if key.descending { "DESC" } else { "ASC" }
        ),
        None => "ORDER BY p.created_at DESC, p.id DESC".to_owned(),
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored slug or price is invalid.
    #[instrument(skip(self))]
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM store.product p WHERE p.id = $1");
        sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .map(Product::try_from)
            .transpose()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored slug or price is invalid.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_by_slug(&self, slug: &Slug) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM store.product p WHERE p.slug = $1");
        sqlx::query_as::<_, ProductRow>(&sql)
            .bind(slug.as_str())
            .fetch_optional(self.pool)
            .await?
            .map(Product::try_from)
            .transpose()
    }

    /// Products by id, in no particular order. Missing ids are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM store.product p WHERE p.id = ANY($1)");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(raw)
            .fetch_all(self.pool)
            .await?;
        rows.into_iter().map(Product::try_from).collect()
    }

    /// Products directly in `category`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_by_category(
        &self,
        category: CategoryId,
        sort: Option<SortKey>,
    ) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM store.product p WHERE p.category_id = $1 {}",
            order_by(sort)
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(category)
            .fetch_all(self.pool)
            .await?;
        rows.into_iter().map(Product::try_from).collect()
    }

    /// Most recently added products across the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn latest(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM store.product p {} LIMIT $1",
            order_by(None)
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;
        rows.into_iter().map(Product::try_from).collect()
    }

    /// Gallery images for a product, first image first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn images(&self, product: ProductId) -> Result<Vec<GalleryImage>, RepositoryError> {
        let rows = sqlx::query_as::<_, GalleryRow>(
            "SELECT id, image, product_id FROM store.gallery WHERE product_id = $1 ORDER BY id",
        )
        .bind(product)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(GalleryImage::from).collect())
    }

    /// URL of the product's first gallery image, or the placeholder.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self, media))]
    pub async fn first_photo_url(
        &self,
        product: ProductId,
        media: &MediaUrls,
    ) -> Result<String, RepositoryError> {
        let image: Option<String> = sqlx::query_scalar(
            "SELECT image FROM store.gallery WHERE product_id = $1 ORDER BY id LIMIT 1",
        )
        .bind(product)
        .fetch_optional(self.pool)
        .await?;
        Ok(media.resolve(image.as_deref()))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, product), fields(title = %product.title))]
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let sql = format!(
            "INSERT INTO store.product AS p \
                 (title, price, quantity, description, category_id, slug, size, color) \
             VALUES ($1, $2, $3, COALESCE($4, 'Tez orada batafsil'), $5, $6, $7, COALESCE($8, 'Kumush')) \
             RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(&product.title)
            .bind(product.price.amount())
            .bind(product.quantity)
            .bind(product.description.as_deref())
            .bind(product.category_id)
            .bind(product.slug.as_ref().map(Slug::as_str))
            .bind(&product.size)
            .bind(product.color.as_deref())
            .fetch_one(self.pool)
            .await
            .map_err(map_unique_violation)?;
        Product::try_from(row)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the product does not exist or
    /// the insert fails.
    #[instrument(skip(self))]
    pub async fn add_image(
        &self,
        product: ProductId,
        image: &str,
    ) -> Result<GalleryImage, RepositoryError> {
        let row = sqlx::query_as::<_, GalleryRow>(
            "INSERT INTO store.gallery (image, product_id) VALUES ($1, $2) \
             RETURNING id, image, product_id",
        )
        .bind(image)
        .bind(product)
        .fetch_one(self.pool)
        .await?;
        Ok(row.into())
    }
}
