//! Seed the catalog from a YAML file.
//!
//! The file is parsed and validated before connecting, so a typo never
//! leaves a half-seeded catalog behind an error about the database.
//!
//! ```yaml
//! categories:
//!   - title: Uzuklar
//!     slug: uzuklar
//!     image: categories/uzuklar.png
//!     children:
//!       - title: Kumush uzuklar
//!         slug: kumush-uzuklar
//! products:
//!   - title: Kumush uzuk
//!     slug: kumush-uzuk
//!     category: kumush-uzuklar
//!     price: 125000
//!     quantity: 4
//!     size: "17"
//!     images: [products/kumush-uzuk-1.jpg]
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

use bozor_core::{CategoryId, Price, Slug};
use bozor_storefront::db::categories::NewCategory;
use bozor_storefront::db::products::NewProduct;
use bozor_storefront::db::{CategoryRepository, ProductRepository, RepositoryError};
use bozor_storefront::models::{Category, Product};

use super::{CommandError, connect};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0} validation errors found")]
    Invalid(usize),

    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("Insert failed: {0}")]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Default, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

#[derive(Debug, Deserialize)]
pub struct CategorySeed {
    pub title: String,
    pub slug: String,
    pub image: Option<String>,
    #[serde(default)]
    pub children: Vec<CategorySeed>,
}

#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    pub title: String,
    pub slug: String,
    /// Slug of the category the product belongs to.
    pub category: String,
    pub price: f64,
    #[serde(default)]
    pub quantity: i32,
    pub size: String,
    pub color: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Seeding summary.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedResult {
    pub categories: usize,
    pub products: usize,
    pub images: usize,
}

impl CategorySeed {
    fn walk<'a>(&'a self, out: &mut Vec<&'a Self>) {
        out.push(self);
        for child in &self.children {
            child.walk(out);
        }
    }
}

impl CatalogFile {
    fn all_categories(&self) -> Vec<&CategorySeed> {
        let mut out = Vec::new();
        for category in &self.categories {
            category.walk(&mut out);
        }
        out
    }
}

/// Check every entry; returns one message per problem.
#[must_use]
pub fn validate(catalog: &CatalogFile) -> Vec<String> {
    let mut errors = Vec::new();
    let mut category_slugs = HashSet::new();

    for category in catalog.all_categories() {
        if category.title.trim().is_empty() {
            errors.push(format!("category {:?}: title is empty", category.slug));
        } else if category.title.chars().count() > Category::TITLE_MAX_LENGTH {
            errors.push(format!("category {:?}: title is too long", category.slug));
        }
        if let Err(e) = Slug::parse(&category.slug) {
            errors.push(format!("category {:?}: {e}", category.slug));
        }
        if !category_slugs.insert(category.slug.as_str()) {
            errors.push(format!("category {:?}: duplicate slug", category.slug));
        }
    }

    let mut product_slugs = HashSet::new();
    for product in &catalog.products {
        let name = &product.slug;
        if product.title.trim().is_empty() {
            errors.push(format!("product {name:?}: title is empty"));
        } else if product.title.chars().count() > Product::TITLE_MAX_LENGTH {
            errors.push(format!("product {name:?}: title is too long"));
        }
        if let Err(e) = Slug::parse(name) {
            errors.push(format!("product {name:?}: {e}"));
        }
        if !product_slugs.insert(name.as_str()) {
            errors.push(format!("product {name:?}: duplicate slug"));
        }
        if !category_slugs.contains(product.category.as_str()) {
            errors.push(format!(
                "product {name:?}: unknown category {:?}",
                product.category
            ));
        }
        if let Err(e) = Price::new(product.price) {
            errors.push(format!("product {name:?}: {e}"));
        }
        if product.quantity < 0 {
            errors.push(format!("product {name:?}: quantity cannot be negative"));
        }
        if product.size.trim().is_empty() || product.size.chars().count() > Product::SIZE_MAX_LENGTH {
            errors.push(format!(
                "product {name:?}: size must be 1 to {} characters",
                Product::SIZE_MAX_LENGTH
            ));
        }
        if product
            .color
            .as_ref()
            .is_some_and(|c| c.chars().count() > Product::COLOR_MAX_LENGTH)
        {
            errors.push(format!("product {name:?}: color is too long"));
        }
    }

    errors
}

/// Seed categories, products and images from `path`.
///
/// # Errors
///
/// Returns `SeedError::Invalid` if validation fails; nothing is inserted.
/// Returns `SeedError::Repository` if an insert fails, e.g. a slug already
/// exists in the database.
pub async fn run(path: &Path) -> Result<(), SeedError> {
    info!(path = %path.display(), "Loading catalog from file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Read {
            path: path.display().to_string(),
            source,
        })?;
    let catalog: CatalogFile = serde_yaml::from_str(&content)?;

    let errors = validate(&catalog);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(SeedError::Invalid(errors.len()));
    }

    let pool = connect().await?;
    let result = insert(&pool, &catalog).await?;

    info!("Seeding complete!");
    info!("  Categories inserted: {}", result.categories);
    info!("  Products inserted: {}", result.products);
    info!("  Gallery images inserted: {}", result.images);
    Ok(())
}

async fn insert(pool: &sqlx::PgPool, catalog: &CatalogFile) -> Result<SeedResult, SeedError> {
    let categories = CategoryRepository::new(pool);
    let products = ProductRepository::new(pool);
    let mut result = SeedResult::default();
    let mut ids: HashMap<String, CategoryId> = HashMap::new();

    // Parents are inserted before their children.
    let mut pending: Vec<(&CategorySeed, Option<CategoryId>)> =
        catalog.categories.iter().rev().map(|c| (c, None)).collect();
    while let Some((seed, parent_id)) = pending.pop() {
        let category = categories
            .create(&NewCategory {
                title: seed.title.trim().to_owned(),
                image: seed.image.clone(),
                slug: Some(parse_slug(&seed.slug)?),
                parent_id,
            })
            .await?;
        ids.insert(seed.slug.clone(), category.id);
        result.categories += 1;
        pending.extend(seed.children.iter().rev().map(|c| (c, Some(category.id))));
    }

    for seed in &catalog.products {
        let category_id = *ids.get(&seed.category).ok_or(SeedError::Invalid(1))?;
        let product = products
            .create(&NewProduct {
                title: seed.title.trim().to_owned(),
                price: Price::new(seed.price).map_err(|_| SeedError::Invalid(1))?,
                quantity: seed.quantity,
                description: seed.description.clone(),
                category_id,
                slug: Some(parse_slug(&seed.slug)?),
                size: seed.size.trim().to_owned(),
                color: seed.color.clone(),
            })
            .await?;
        result.products += 1;

        for image in &seed.images {
            products.add_image(product.id, image).await?;
            result.images += 1;
        }
    }

    Ok(result)
}

fn parse_slug(raw: &str) -> Result<Slug, SeedError> {
    Slug::parse(raw).map_err(|_| SeedError::Invalid(1))
}
