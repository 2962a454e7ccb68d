//! Favourite products route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;
use tracing::instrument;

use bozor_core::ProductId;

use super::home::product_cards;
use super::views::{PageContext, ProductCardView, safe_next};
use crate::catalog;
use crate::db::{FavouriteRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAuth;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ToggleForm {
    /// Where to go afterwards; defaults to the favourites page.
    pub next: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "favourites.html")]
pub struct FavouritesTemplate {
    pub ctx: PageContext,
    pub products: Vec<ProductCardView>,
}

/// List the user's favourite products.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse> {
    let products = catalog::favourite_products(state.pool(), user.id).await?;
    let user_id = user.id;
    let ctx = PageContext::load(&state, Some(user)).await?;
    let products = product_cards(&state, Some(user_id), &products).await?;

    Ok(FavouritesTemplate { ctx, products })
}

/// Add the product to favourites, or remove it if already there.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn toggle(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
    Form(form): Form<ToggleForm>,
) -> Result<impl IntoResponse> {
    ProductRepository::new(state.pool())
        .get(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let added = FavouriteRepository::new(state.pool())
        .toggle(user.id, product_id)
        .await?;
    tracing::info!(%product_id, added, "Favourite toggled");

    Ok(Redirect::to(&safe_next(form.next.as_deref(), "/favourites")))
}
