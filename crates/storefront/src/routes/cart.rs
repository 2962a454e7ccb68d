//! Cart and checkout route handlers.
//!
//! Every cart page requires a logged-in user; the cart is the user's open
//! order (see [`crate::services::cart`]).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use bozor_core::{OrderProductId, ProductId};

use super::views::{CartLineView, CartView, FieldView, PageContext, field_views};
use crate::db::{ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::filters;
use crate::forms::{FormErrors, ShippingForm};
use crate::middleware::RequireAuth;
use crate::models::{Cart, CurrentUser, ShippingAddress};
use crate::services::cart::CartService;
use crate::state::AppState;

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub ctx: PageContext,
    pub cart: CartView,
}

#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub ctx: PageContext,
    pub cart: CartView,
    pub fields: Vec<FieldView>,
    pub non_field_errors: Vec<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "checkout_success.html")]
pub struct CheckoutSuccessTemplate {
    pub ctx: PageContext,
    pub address: ShippingAddress,
}

async fn cart_view(state: &AppState, cart: Option<&Cart>) -> Result<CartView> {
    let Some(cart) = cart else {
        return Ok(CartView::empty());
    };
    let products = ProductRepository::new(state.pool());
    let mut lines = Vec::with_capacity(cart.lines.len());
    for line in &cart.lines {
        let image_url = match &line.product {
            Some(product) => products.first_photo_url(product.id, state.media()).await?,
            None => state.media().placeholder().to_string(),
        };
        lines.push(CartLineView::new(line, image_url));
    }
    Ok(CartView::new(cart, lines))
}

fn missing_line(err: RepositoryError, what: String) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound(what),
        other => other.into(),
    }
}

// =============================================================================
// Cart Routes
// =============================================================================

/// Display the cart page.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse> {
    let cart = CartService::new(state.pool()).current(user.id).await?;
    let cart = cart_view(&state, cart.as_ref()).await?;
    let ctx = PageContext::load(&state, Some(user)).await?;
    Ok(CartTemplate { ctx, cart })
}

/// Add one unit of a product to the cart.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    ProductRepository::new(state.pool())
        .get(product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let line = CartService::new(state.pool())
        .add(user.id, product_id)
        .await?;
    tracing::info!(%product_id, quantity = ?line.quantity, "Added to cart");

    Ok(Redirect::to("/cart"))
}

/// Remove one unit of a product from the cart.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    CartService::new(state.pool())
        .remove(user.id, product_id)
        .await
        .map_err(|e| missing_line(e, format!("cart line for product {product_id}")))?;

    Ok(Redirect::to("/cart"))
}

/// Drop a whole line from the cart.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_line(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(line_id): Path<OrderProductId>,
) -> Result<impl IntoResponse> {
    CartService::new(state.pool())
        .delete_line(user.id, line_id)
        .await
        .map_err(|e| missing_line(e, format!("cart line {line_id}")))?;

    Ok(Redirect::to("/cart"))
}

// =============================================================================
// Checkout Routes
// =============================================================================

async fn render_checkout(
    state: &AppState,
    user: CurrentUser,
    cart: &Cart,
    form: &ShippingForm,
    errors: &FormErrors,
) -> Result<CheckoutTemplate> {
    let cart = cart_view(state, Some(cart)).await?;
    let ctx = PageContext::load(state, Some(user)).await?;
    Ok(CheckoutTemplate {
        ctx,
        cart,
        fields: field_views(ShippingForm::FIELDS, |f| form.value(f), errors),
        non_field_errors: errors.non_field().to_vec(),
    })
}

/// Display the shipping form. An empty cart goes back to the cart page.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn checkout_page(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Response> {
    let cart = CartService::new(state.pool()).current(user.id).await?;
    match cart {
        Some(cart) if !cart.is_empty() => {
            let page = render_checkout(
                &state,
                user,
                &cart,
                &ShippingForm::default(),
                &FormErrors::new(),
            )
            .await?;
            Ok(page.into_response())
        }
        _ => Ok(Redirect::to("/cart").into_response()),
    }
}

/// Submit the shipping form and close the cart.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<ShippingForm>,
) -> Result<Response> {
    let service = CartService::new(state.pool());

    let address = match form.validate() {
        Ok(address) => address,
        Err(errors) => {
            return match service.current(user.id).await? {
                Some(cart) if !cart.is_empty() => {
                    let page = render_checkout(&state, user, &cart, &form, &errors).await?;
                    Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
                }
                _ => Ok(Redirect::to("/cart").into_response()),
            };
        }
    };

    match service.checkout(user.id, &address).await {
        Ok(address) => {
            tracing::info!(order_id = ?address.order_id, "Order placed");
            let ctx = PageContext::load(&state, Some(user)).await?;
            Ok(CheckoutSuccessTemplate { ctx, address }.into_response())
        }
        Err(RepositoryError::Conflict(reason)) => {
            tracing::warn!(%reason, "Checkout rejected");
            Ok(Redirect::to("/cart").into_response())
        }
        Err(e) => Err(e.into()),
    }
}
