//! Display data shared by page templates.
//!
//! Templates receive pre-formatted strings; nothing here touches the
//! database except [`PageContext::load`].

use bozor_core::media::MediaUrls;

use crate::catalog;
use crate::error::Result;
use crate::filters::format_money;
use crate::forms::{FieldSpec, FormErrors};
use crate::models::{Cart, CartLine, Category, CurrentUser, Product, ReviewWithAuthor};
use crate::services::cart::CartService;
use crate::state::AppState;

/// Layout data every page needs: navigation, login state, cart badge.
#[derive(Clone)]
pub struct PageContext {
    pub categories: Vec<CategoryView>,
    pub user: Option<CurrentUser>,
    pub cart_count: i64,
}

impl PageContext {
    /// # Errors
    ///
    /// Returns `AppError::Database` if navigation or cart lookups fail.
    pub async fn load(state: &AppState, user: Option<CurrentUser>) -> Result<Self> {
        let categories = catalog::top_level_categories(state.pool())
            .await?
            .iter()
            .map(|c| CategoryView::new(c, state.media()))
            .collect();

        let cart_count = match &user {
            Some(user) => CartService::new(state.pool())
                .current(user.id)
                .await?
                .map_or(0, |cart| cart.total_quantity()),
            None => 0,
        };

        Ok(Self {
            categories,
            user,
            cart_count,
        })
    }

    #[must_use]
    pub fn username(&self) -> &str {
        self.user.as_ref().map_or("", |u| u.username.as_str())
    }

    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }
}

#[derive(Clone)]
pub struct CategoryView {
    pub title: String,
    pub url: String,
    pub image_url: String,
}

impl CategoryView {
    #[must_use]
    pub fn new(category: &Category, media: &MediaUrls) -> Self {
        Self {
            title: category.title.clone(),
            url: category.absolute_url().unwrap_or_else(|| "#".to_string()),
            image_url: category.image_url(media),
        }
    }
}

/// Product tile on listings.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: i32,
    pub title: String,
    pub url: String,
    pub price: String,
    pub color: String,
    pub size: String,
    pub image_url: String,
    pub is_favourite: bool,
}

impl ProductCardView {
    #[must_use]
    pub fn new(product: &Product, image_url: String, is_favourite: bool) -> Self {
        Self {
            id: product.id.as_i32(),
            title: product.title.clone(),
            url: product.absolute_url().unwrap_or_else(|| "#".to_string()),
            price: format_money(product.price.amount()),
            color: product.color.clone(),
            size: product.size.clone(),
            image_url,
            is_favourite,
        }
    }
}

#[derive(Clone)]
pub struct ReviewView {
    pub author: String,
    pub text: String,
    pub date: String,
}

impl From<&ReviewWithAuthor> for ReviewView {
    fn from(review: &ReviewWithAuthor) -> Self {
        Self {
            author: review.author.clone(),
            text: review.review.text.clone(),
            date: review.review.created_at.format("%d.%m.%Y").to_string(),
        }
    }
}

#[derive(Clone)]
pub struct CartLineView {
    pub line_id: i32,
    /// `None` when the product has been deleted.
    pub product_id: Option<i32>,
    pub title: String,
    pub url: String,
    pub price: String,
    pub quantity: i32,
    pub line_total: String,
    pub image_url: String,
}

impl CartLineView {
    #[must_use]
    pub fn new(line: &CartLine, image_url: String) -> Self {
        let (title, url, price) = line.product.as_ref().map_or_else(
            || ("Mahsulot mavjud emas".to_string(), "#".to_string(), format_money(0.0)),
            |p| {
                (
                    p.title.clone(),
                    p.absolute_url().unwrap_or_else(|| "#".to_string()),
                    format_money(p.price.amount()),
                )
            },
        );
        Self {
            line_id: line.item.id.as_i32(),
            product_id: line.product.as_ref().map(|p| p.id.as_i32()),
            title,
            url,
            price,
            quantity: line.quantity(),
            line_total: format_money(line.total_price()),
            image_url,
        }
    }
}

#[derive(Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total_price: String,
    pub total_quantity: i64,
}

impl CartView {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            lines: Vec::new(),
            total_price: format_money(0.0),
            total_quantity: 0,
        }
    }

    #[must_use]
    pub fn new(cart: &Cart, lines: Vec<CartLineView>) -> Self {
        Self {
            lines,
            total_price: format_money(cart.total_price()),
            total_quantity: cart.total_quantity(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_quantity == 0
    }
}

/// One rendered form input.
#[derive(Clone)]
pub struct FieldView {
    pub spec: FieldSpec,
    pub value: String,
    pub errors: Vec<String>,
}

/// Pair each field spec with its current value and errors.
pub fn field_views<'a>(
    specs: &[FieldSpec],
    value: impl Fn(&str) -> &'a str,
    errors: &FormErrors,
) -> Vec<FieldView> {
    specs
        .iter()
        .map(|spec| FieldView {
            spec: *spec,
            value: if spec.keeps_value() {
                value(spec.name).to_string()
            } else {
                String::new()
            },
            errors: errors.field(spec.name).to_vec(),
        })
        .collect()
}

/// Validate a post-action redirect target: a local absolute path only.
#[must_use]
pub fn safe_next(next: Option<&str>, fallback: &str) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => fallback.to_string(),
    }
}
