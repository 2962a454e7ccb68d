//! Product detail and review route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use bozor_core::Slug;

use super::views::{CategoryView, FieldView, PageContext, ReviewView, field_views};
use crate::db::{CategoryRepository, FavouriteRepository, ProductRepository, ReviewRepository};
use crate::error::{AppError, Result};
use crate::filters;
use crate::filters::format_money;
use crate::forms::{FormErrors, ReviewForm};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::models::{CurrentUser, Product};
use crate::state::AppState;

/// Product detail data for templates.
#[derive(Clone)]
pub struct ProductDetailView {
    pub id: i32,
    pub title: String,
    pub url: String,
    pub price: String,
    pub description: String,
    pub color: String,
    pub size: String,
    pub quantity: i32,
    pub in_stock: bool,
    pub images: Vec<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductTemplate {
    pub ctx: PageContext,
    pub product: ProductDetailView,
    pub category: Option<CategoryView>,
    pub reviews: Vec<ReviewView>,
    pub fields: Vec<FieldView>,
    pub is_favourite: bool,
}

async fn load_product(state: &AppState, slug: &str) -> Result<Product> {
    let not_found = || AppError::NotFound(format!("product {slug}"));
    let slug = Slug::parse(slug).map_err(|_| not_found())?;
    ProductRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(not_found)
}

async fn render(
    state: &AppState,
    user: Option<CurrentUser>,
    product: &Product,
    review: &ReviewForm,
    errors: &FormErrors,
) -> Result<ProductTemplate> {
    let repo = ProductRepository::new(state.pool());
    let images: Vec<String> = repo
        .images(product.id)
        .await?
        .iter()
        .map(|image| image.url(state.media()))
        .collect();
    let images = if images.is_empty() {
        vec![Product::first_photo_url(&[], state.media())]
    } else {
        images
    };

    let category = CategoryRepository::new(state.pool())
        .get(product.category_id)
        .await?
        .map(|c| CategoryView::new(&c, state.media()));

    let reviews = ReviewRepository::new(state.pool())
        .list_for_product(product.id)
        .await?
        .iter()
        .map(ReviewView::from)
        .collect();

    let is_favourite = match &user {
        Some(user) => {
            FavouriteRepository::new(state.pool())
                .is_favourite(user.id, product.id)
                .await?
        }
        None => false,
    };

    let ctx = PageContext::load(state, user).await?;

    Ok(ProductTemplate {
        ctx,
        product: ProductDetailView {
            id: product.id.as_i32(),
            title: product.title.clone(),
            url: product.absolute_url().unwrap_or_default(),
            price: format_money(product.price.amount()),
            description: product.description.clone(),
            color: product.color.clone(),
            size: product.size.clone(),
            quantity: product.quantity,
            in_stock: product.in_stock(),
            images,
        },
        category,
        reviews,
        fields: field_views(ReviewForm::FIELDS, |_| review.text.as_str(), errors),
        is_favourite,
    })
}

/// Display product detail page.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse> {
    let product = load_product(&state, &slug).await?;
    render(
        &state,
        user,
        &product,
        &ReviewForm::default(),
        &FormErrors::new(),
    )
    .await
}

/// Post a review. Invalid input re-renders the page with errors.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn create_review(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(slug): Path<String>,
    Form(form): Form<ReviewForm>,
) -> Result<Response> {
    let product = load_product(&state, &slug).await?;

    match form.validate() {
        Ok(text) => {
            ReviewRepository::new(state.pool())
                .create(user.id, product.id, &text)
                .await?;
            tracing::info!(product_id = %product.id, "Review posted");
            let url = product
                .absolute_url()
                .unwrap_or_else(|| "/".to_string());
            Ok(Redirect::to(&format!("{url}#reviews")).into_response())
        }
        Err(errors) => {
            let page = render(&state, Some(user), &product, &form, &errors).await?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
    }
}
