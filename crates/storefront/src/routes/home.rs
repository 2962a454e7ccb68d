//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use super::views::{CategoryView, PageContext, ProductCardView};
use crate::db::{FavouriteRepository, ProductRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

/// Products shown in the "new arrivals" strip.
const LATEST_PRODUCTS: i64 = 12;

#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub ctx: PageContext,
    pub categories: Vec<CategoryView>,
    pub products: Vec<ProductCardView>,
}

/// Display the home page.
#[instrument(skip(state, user))]
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Result<impl IntoResponse> {
    let ctx = PageContext::load(&state, user).await?;
    let products = ProductRepository::new(state.pool())
        .latest(LATEST_PRODUCTS)
        .await?;
    let cards = product_cards(&state, ctx.user.as_ref().map(|u| u.id), &products).await?;

    Ok(HomeTemplate {
        categories: ctx.categories.clone(),
        ctx,
        products: cards,
    })
}

/// Listing tiles with first photo and favourite flag.
pub(crate) async fn product_cards(
    state: &AppState,
    user: Option<bozor_core::UserId>,
    products: &[crate::models::Product],
) -> Result<Vec<ProductCardView>> {
    let favourites = match user {
        Some(user) => {
            FavouriteRepository::new(state.pool())
                .product_ids_for_user(user)
                .await?
        }
        None => Vec::new(),
    };

    let repo = ProductRepository::new(state.pool());
    let mut cards = Vec::with_capacity(products.len());
    for product in products {
        let image_url = repo.first_photo_url(product.id, state.media()).await?;
        cards.push(ProductCardView::new(
            product,
            image_url,
            favourites.contains(&product.id),
        ));
    }
    Ok(cards)
}
