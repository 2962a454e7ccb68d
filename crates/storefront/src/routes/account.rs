//! Account page: customer profile and past shipping addresses.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use super::views::{FieldView, PageContext, field_views};
use crate::db::{CustomerRepository, OrderRepository};
use crate::error::Result;
use crate::filters;
use crate::forms::{CustomerForm, FormErrors};
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, Customer, ShippingAddress};
use crate::services::cart::CartService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AccountQuery {
    pub saved: Option<String>,
}

#[derive(Clone)]
pub struct AddressView {
    pub address: String,
    pub city: String,
    pub region: String,
    pub phone: String,
    pub date: String,
}

impl From<&ShippingAddress> for AddressView {
    fn from(address: &ShippingAddress) -> Self {
        Self {
            address: address.address.clone(),
            city: address.city.clone(),
            region: address.region.clone(),
            phone: address.phone.clone(),
            date: address.created_at.format("%d.%m.%Y").to_string(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "account.html")]
pub struct AccountTemplate {
    pub ctx: PageContext,
    pub full_name: String,
    pub fields: Vec<FieldView>,
    pub addresses: Vec<AddressView>,
    pub saved: bool,
}

async fn render(
    state: &AppState,
    user: CurrentUser,
    customer: &Customer,
    form: &CustomerForm,
    errors: &FormErrors,
    saved: bool,
) -> Result<AccountTemplate> {
    let addresses = OrderRepository::new(state.pool())
        .shipping_addresses(customer.id)
        .await?
        .iter()
        .map(AddressView::from)
        .collect();
    let ctx = PageContext::load(state, Some(user)).await?;

    Ok(AccountTemplate {
        ctx,
        full_name: customer.full_name(),
        fields: field_views(CustomerForm::FIELDS, |f| form.value(f), errors),
        addresses,
        saved,
    })
}

/// Display the account page.
#[instrument(skip(state, user, query), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<AccountQuery>,
) -> Result<impl IntoResponse> {
    let customer = CartService::new(state.pool()).customer(user.id).await?;
    let form = CustomerForm::from_customer(&customer);
    render(
        &state,
        user,
        &customer,
        &form,
        &FormErrors::new(),
        query.saved.is_some(),
    )
    .await
}

/// Update the customer's names.
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Form(form): Form<CustomerForm>,
) -> Result<Response> {
    let customer = CartService::new(state.pool()).customer(user.id).await?;

    match form.validate() {
        Ok(names) => {
            CustomerRepository::new(state.pool())
                .update_names(customer.id, &names.first_name, &names.last_name)
                .await?;
            tracing::info!(customer_id = %customer.id, "Profile updated");
            Ok(Redirect::to("/account?saved=1").into_response())
        }
        Err(errors) => {
            let page = render(&state, user, &customer, &form, &errors, false).await?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
    }
}
