//! Presentation helpers shared by page handlers and templates.

use sqlx::PgPool;

use bozor_core::UserId;
use bozor_core::sorting::{SORT_OPTIONS, SortGroup};

use crate::db::{CategoryRepository, FavouriteRepository, RepositoryError};
use crate::models::{Category, Product};

/// Categories with no parent, for the navigation bar.
///
/// # Errors
///
/// Returns `RepositoryError` if the query fails.
pub async fn top_level_categories(pool: &PgPool) -> Result<Vec<Category>, RepositoryError> {
    CategoryRepository::new(pool).top_level().await
}

/// Direct children of `category`.
///
/// # Errors
///
/// Returns `RepositoryError` if the query fails.
pub async fn subcategories(
    pool: &PgPool,
    category: &Category,
) -> Result<Vec<Category>, RepositoryError> {
    CategoryRepository::new(pool).subcategories(category.id).await
}

/// Sort choices offered on product listings, in display order.
#[must_use]
pub const fn sort_options() -> &'static [SortGroup] {
    SORT_OPTIONS
}

/// Products the user has favourited.
///
/// # Errors
///
/// Returns `RepositoryError` if the query fails.
pub async fn favourite_products(
    pool: &PgPool,
    user: UserId,
) -> Result<Vec<Product>, RepositoryError> {
    FavouriteRepository::new(pool).products_for_user(user).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_options_are_the_static_catalog() {
        let options = sort_options();
        assert_eq!(options.len(), 3);
        assert_eq!(options[0].title, "Narxi");
        assert_eq!(options[0].options[0].field, "-price");
        assert_eq!(options[2].options[1].label, "Kattalari");
    }
}
