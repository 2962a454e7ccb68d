//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                             - Home page (top-level categories, newest products)
//! GET  /health                       - Liveness check
//! GET  /health/ready                 - Readiness check (database)
//!
//! # Catalog
//! GET  /categories/{slug}?sort=      - Category listing with subcategories
//! GET  /products/{slug}              - Product detail with gallery and reviews
//! POST /products/{slug}/reviews      - Post a review (auth)
//!
//! # Favourites (auth)
//! GET  /favourites                   - Favourite products
//! POST /favourites/{product_id}      - Toggle favourite
//!
//! # Cart and checkout (auth)
//! GET  /cart                         - Open cart
//! POST /cart/add/{product_id}        - Add one unit
//! POST /cart/remove/{product_id}     - Remove one unit
//! POST /cart/delete/{line_id}        - Delete a line
//! GET  /checkout                     - Shipping form
//! POST /checkout                     - Place order
//!
//! # Account
//! GET  /account                      - Profile and order history (auth)
//! POST /account                      - Update profile (auth)
//! GET  /auth/login                   - Login page
//! POST /auth/login                   - Login action
//! GET  /auth/register                - Register page
//! POST /auth/register                - Register action
//! POST /auth/logout                  - Logout action
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod favourites;
pub mod home;
pub mod products;
pub mod views;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{create_session_layer, request_id_middleware};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add/{product_id}", post(cart::add))
        .route("/remove/{product_id}", post(cart::remove))
        .route("/delete/{line_id}", post(cart::delete_line))
}

/// Create all page routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/categories/{slug}", get(categories::show))
        .route("/products/{slug}", get(products::show))
        .route("/products/{slug}/reviews", post(products::create_review))
        .route("/favourites", get(favourites::index))
        .route("/favourites/{product_id}", post(favourites::toggle))
        .nest("/cart", cart_routes())
        .route("/checkout", get(cart::checkout_page).post(cart::checkout))
        .route("/account", get(account::show).post(account::update))
        .nest("/auth", auth_routes())
}

/// Build the full application: pages, health checks, static files, sessions
/// and request tracing.
///
/// Sentry layers are added by the binary on top of this.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.pool(), state.config());

    let mut router = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .nest_service("/static", ServeDir::new("crates/storefront/static"));

    if let Some(mount) = state.config().media.local_mount() {
        router = router.nest_service(&mount, ServeDir::new(&state.config().media.dir));
    }

    router
        .layer(session_layer)
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check. Returns 503 if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{MediaConfig, StorefrontConfig};

    /// State whose pool never connects unless a query runs.
    fn lazy_state() -> AppState {
        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost:1/bozor_unused"),
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            media: MediaConfig::default(),
            sentry_dsn: None,
            sentry_environment: "test".to_string(),
        };
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost:1/bozor_unused")
            .unwrap();
        AppState::new(config, pool)
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(lazy_state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_upstream_request_id_is_echoed() {
        let response = app(lazy_state())
            .oneshot(
                Request::get("/health")
                    .header("x-request-id", "edge-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "edge-123");
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = app(lazy_state())
            .oneshot(Request::get("/no-such-page").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
