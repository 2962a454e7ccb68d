//! Categories, products and product images.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use bozor_core::media::MediaUrls;
use bozor_core::{CategoryId, FavouriteId, GalleryId, Price, ProductId, Slug, UserId};

/// A node in the category tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub title: String,
    /// Stored image path, relative to the media root.
    pub image: Option<String>,
    pub slug: Option<Slug>,
    /// `None` for top-level categories.
    pub parent_id: Option<CategoryId>,
}

impl Category {
    pub const TITLE_MAX_LENGTH: usize = 150;

    /// Image URL, or the placeholder when no image was uploaded.
    #[must_use]
    pub fn image_url(&self, media: &MediaUrls) -> String {
        media.resolve(self.image.as_deref())
    }

    /// Listing page URL. Categories without a slug have no page.
    #[must_use]
    pub fn absolute_url(&self) -> Option<String> {
        self.slug.as_ref().map(|slug| format!("/categories/{slug}"))
    }

    #[must_use]
    pub const fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    pub created_at: DateTime<Utc>,
    pub quantity: i32,
    pub description: String,
    pub category_id: CategoryId,
    pub slug: Option<Slug>,
    pub size: String,
    pub color: String,
}

impl Product {
    pub const TITLE_MAX_LENGTH: usize = 150;
    pub const SIZE_MAX_LENGTH: usize = 40;
    pub const COLOR_MAX_LENGTH: usize = 40;
    pub const DEFAULT_DESCRIPTION: &'static str = "Tez orada batafsil";
    pub const DEFAULT_COLOR: &'static str = "Kumush";

    /// Detail page URL. Products without a slug have no page.
    #[must_use]
    pub fn absolute_url(&self) -> Option<String> {
        self.slug.as_ref().map(|slug| format!("/products/{slug}"))
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.quantity > 0
    }

    /// URL of the product's first gallery image, or the placeholder.
    ///
    /// `images` must be in gallery order (ascending id), as returned by
    /// [`crate::db::products::ProductRepository::images`].
    #[must_use]
    pub fn first_photo_url(images: &[GalleryImage], media: &MediaUrls) -> String {
        media.resolve(images.first().map(|image| image.image.as_str()))
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

/// One image in a product's gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryImage {
    pub id: GalleryId,
    pub image: String,
    pub product_id: ProductId,
}

impl GalleryImage {
    #[must_use]
    pub fn url(&self, media: &MediaUrls) -> String {
        media.resolve(Some(&self.image))
    }
}

/// A user's bookmark on a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FavouriteProduct {
    pub id: FavouriteId,
    pub user_id: UserId,
    pub product_id: ProductId,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bozor_core::media::PLACEHOLDER_IMAGE_URL;

    use super::*;

    fn category(image: Option<&str>, slug: Option<&str>) -> Category {
        Category {
            id: CategoryId::new(1),
            title: "Uzuklar".to_string(),
            image: image.map(String::from),
            slug: slug.map(|s| Slug::parse(s).unwrap()),
            parent_id: None,
        }
    }

    fn image(id: i32, path: &str) -> GalleryImage {
        GalleryImage {
            id: GalleryId::new(id),
            image: path.to_string(),
            product_id: ProductId::new(7),
        }
    }

    #[test]
    fn test_category_image_url() {
        let media = MediaUrls::default();
        assert_eq!(
            category(Some("categories/rings.jpg"), None).image_url(&media),
            "/media/categories/rings.jpg"
        );
        assert_eq!(category(None, None).image_url(&media), PLACEHOLDER_IMAGE_URL);
    }

    #[test]
    fn test_category_absolute_url() {
        assert_eq!(
            category(None, Some("uzuklar")).absolute_url().as_deref(),
            Some("/categories/uzuklar")
        );
        assert_eq!(category(None, None).absolute_url(), None);
        assert_eq!(category(None, None).to_string(), "Uzuklar");
    }

    #[test]
    fn test_first_photo_url() {
        let media = MediaUrls::default();
        let images = [image(3, "products/a.jpg"), image(9, "products/b.jpg")];
        assert_eq!(
            Product::first_photo_url(&images, &media),
            "/media/products/a.jpg"
        );
        assert_eq!(Product::first_photo_url(&[], &media), PLACEHOLDER_IMAGE_URL);
    }
}
