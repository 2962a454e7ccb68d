//! Authentication route handlers: login, registration, logout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::views::{FieldView, PageContext, field_views, safe_next};
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::forms::{FormErrors, LoginForm, RegistrationForm};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

pub const USERNAME_TAKEN: &str = "A user with that username already exists.";
pub const EMAIL_TAKEN: &str = "A user with that email already exists.";

// =============================================================================
// Query Types
// =============================================================================

/// Where to go after logging in.
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub ctx: PageContext,
    pub fields: Vec<FieldView>,
    pub non_field_errors: Vec<String>,
    pub next: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub ctx: PageContext,
    pub fields: Vec<FieldView>,
    pub non_field_errors: Vec<String>,
}

async fn login_template(
    state: &AppState,
    user: Option<CurrentUser>,
    form: &LoginForm,
    errors: &FormErrors,
    next: String,
) -> Result<LoginTemplate> {
    Ok(LoginTemplate {
        ctx: PageContext::load(state, user).await?,
        fields: field_views(LoginForm::FIELDS, |f| form.value(f), errors),
        non_field_errors: errors.non_field().to_vec(),
        next,
    })
}

async fn register_template(
    state: &AppState,
    user: Option<CurrentUser>,
    form: &RegistrationForm,
    errors: &FormErrors,
) -> Result<RegisterTemplate> {
    Ok(RegisterTemplate {
        ctx: PageContext::load(state, user).await?,
        fields: field_views(RegistrationForm::FIELDS, |f| form.value(f), errors),
        non_field_errors: errors.non_field().to_vec(),
    })
}

async fn start_session(session: &Session, user: &User) -> Result<()> {
    let current = CurrentUser {
        id: user.id,
        username: user.username.clone(),
    };
    set_current_user(session, &current).await?;
    set_sentry_user(&user.id, &user.username);
    Ok(())
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
#[instrument(skip(state, user))]
pub async fn login_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(query): Query<NextQuery>,
) -> Result<impl IntoResponse> {
    let next = safe_next(query.next.as_deref(), "/");
    login_template(&state, user, &LoginForm::default(), &FormErrors::new(), next).await
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let next = safe_next(query.next.as_deref(), "/");

    let errors = match form.validate() {
        Ok(credentials) => match AuthService::new(state.pool()).login(&credentials).await {
            Ok(user) => {
                start_session(&session, &user).await?;
                tracing::info!(user_id = %user.id, "User logged in");
                return Ok(Redirect::to(&next).into_response());
            }
            Err(AuthError::InvalidCredentials) => {
                tracing::warn!(username = %credentials.username, "Login failed");
                let mut errors = FormErrors::new();
                errors.add_non_field(LoginForm::INVALID_CREDENTIALS);
                errors
            }
            Err(e) => return Err(e.into()),
        },
        Err(errors) => errors,
    };

    let page = login_template(&state, None, &form, &errors, next).await?;
    Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
#[instrument(skip(state, user))]
pub async fn register_page(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
) -> Result<impl IntoResponse> {
    register_template(&state, user, &RegistrationForm::default(), &FormErrors::new()).await
}

/// Create an account with its customer profile and log it in.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegistrationForm>,
) -> Result<Response> {
    let errors = match form.validate() {
        Ok(account) => match AuthService::new(state.pool()).register(&account).await {
            Ok((user, _customer)) => {
                start_session(&session, &user).await?;
                return Ok(Redirect::to("/").into_response());
            }
            Err(AuthError::UsernameTaken) => {
                let mut errors = FormErrors::new();
                errors.add("username", USERNAME_TAKEN);
                errors
            }
            Err(AuthError::EmailTaken) => {
                let mut errors = FormErrors::new();
                errors.add("email", EMAIL_TAKEN);
                errors
            }
            Err(e) => return Err(e.into()),
        },
        Err(errors) => errors,
    };

    let page = register_template(&state, None, &form, &errors).await?;
    Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
}

// =============================================================================
// Logout
// =============================================================================

/// Log out and return to the home page.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<impl IntoResponse> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}
