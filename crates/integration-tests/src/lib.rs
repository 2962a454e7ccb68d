//! Integration tests for Bozor.
//!
//! Every test is `#[ignore]`d because it needs external services:
//!
//! - `tests/database.rs` needs a `PostgreSQL` database
//!   (`STOREFRONT_DATABASE_URL`); migrations are applied on connect.
//! - `tests/storefront_http.rs` also needs a running storefront
//!   (`STOREFRONT_BASE_URL`, default `http://localhost:3000`).
//!
//! ```bash
//! cargo test -p bozor-integration-tests -- --ignored
//! ```

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use bozor_core::{Email, Price, Slug};
use bozor_storefront::db::categories::NewCategory;
use bozor_storefront::db::products::NewProduct;
use bozor_storefront::db::{CategoryRepository, ProductRepository};
use bozor_storefront::forms::NewAccount;
use bozor_storefront::models::{Category, Customer, Product, User};
use bozor_storefront::services::auth::AuthService;
use secrecy::SecretString;
use sqlx::PgPool;
use uuid::Uuid;

/// Base URL of a running storefront.
#[must_use]
pub fn storefront_base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Connect to the test database and apply migrations.
pub async fn test_pool() -> PgPool {
    let url = std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("STOREFRONT_DATABASE_URL must be set for integration tests");
    let pool = bozor_storefront::db::create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to test database");
    sqlx::migrate!("../storefront/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// A short identifier unique to this test run, usable in slugs and usernames.
#[must_use]
pub fn unique(prefix: &str) -> String {
    let id: String = Uuid::new_v4().simple().to_string().chars().take(12).collect();
    format!("{prefix}-{id}")
}

pub async fn create_category(pool: &PgPool, parent: Option<&Category>) -> Category {
    let slug = unique("cat");
    CategoryRepository::new(pool)
        .create(&NewCategory {
            title: format!("Kategoriya {slug}"),
            image: None,
            slug: Some(Slug::parse(&slug).expect("valid slug")),
            parent_id: parent.map(|c| c.id),
        })
        .await
        .expect("Failed to create category")
}

pub async fn create_product(pool: &PgPool, category: &Category, price: f64) -> Product {
    let slug = unique("prod");
    ProductRepository::new(pool)
        .create(&NewProduct {
            title: format!("Mahsulot {slug}"),
            price: Price::new(price).expect("valid price"),
            quantity: 10,
            description: None,
            category_id: category.id,
            slug: Some(Slug::parse(&slug).expect("valid slug")),
            size: "17".to_string(),
            color: None,
        })
        .await
        .expect("Failed to create product")
}

/// A new account with a random username and email.
#[must_use]
pub fn new_account() -> NewAccount {
    let username = unique("user").replace('-', "_");
    NewAccount {
        email: Email::parse(&format!("{username}@example.uz")).expect("valid email"),
        username,
        first_name: "Aziza".to_string(),
        last_name: "Karimova".to_string(),
        password: SecretString::from("kumush-uzuk-2026"),
    }
}

pub async fn register(pool: &PgPool) -> (User, Customer) {
    AuthService::new(pool)
        .register(&new_account())
        .await
        .expect("Failed to register user")
}
