//! Category listing route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use bozor_core::Slug;
use bozor_core::sorting::{SortGroup, SortKey};

use super::home::product_cards;
use super::views::{CategoryView, PageContext, ProductCardView};
use crate::catalog;
use crate::db::{CategoryRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    pub sort: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "categories/show.html")]
pub struct CategoryTemplate {
    pub ctx: PageContext,
    pub category: CategoryView,
    pub subcategories: Vec<CategoryView>,
    pub products: Vec<ProductCardView>,
    pub sort_groups: &'static [SortGroup],
    /// The applied sort key, empty for the default order.
    pub sort: String,
}

/// Display a category with its subcategories and products.
#[instrument(skip(state, user, query))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(slug): Path<String>,
    Query(query): Query<ListingQuery>,
) -> Result<impl IntoResponse> {
    let not_found = || AppError::NotFound(format!("category {slug}"));
    let parsed = Slug::parse(&slug).map_err(|_| not_found())?;
    let category = CategoryRepository::new(state.pool())
        .get_by_slug(&parsed)
        .await?
        .ok_or_else(not_found)?;

    let sort = query.sort.as_deref().and_then(SortKey::parse);
    let products = ProductRepository::new(state.pool())
        .list_by_category(category.id, sort)
        .await?;
    let subcategories = catalog::subcategories(state.pool(), &category).await?;

    let ctx = PageContext::load(&state, user).await?;
    let products = product_cards(&state, ctx.user.as_ref().map(|u| u.id), &products).await?;

    Ok(CategoryTemplate {
        category: CategoryView::new(&category, state.media()),
        subcategories: subcategories
            .iter()
            .map(|c| CategoryView::new(c, state.media()))
            .collect(),
        products,
        sort_groups: catalog::sort_options(),
        sort: sort.map(|k| k.to_string()).unwrap_or_default(),
        ctx,
    })
}
