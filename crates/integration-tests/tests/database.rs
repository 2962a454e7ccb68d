//! Database integration tests for repositories, services and deletion.
//!
//! These tests require a `PostgreSQL` database in `STOREFRONT_DATABASE_URL`.
//!
//! Run with: cargo test -p bozor-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::expect_used)]

use bozor_core::relations::Entity;
use bozor_integration_tests::{create_category, create_product, new_account, register, test_pool};
use bozor_storefront::db::orders::NewShippingAddress;
use bozor_storefront::db::{
    CategoryRepository, FavouriteRepository, OrderRepository, ProductRepository, RepositoryError,
    ReviewRepository, delete_entity,
};
use bozor_storefront::services::auth::{AuthError, AuthService};
use bozor_storefront::services::cart::CartService;

fn address() -> NewShippingAddress {
    NewShippingAddress {
        address: "Amir Temur ko'chasi 15".to_string(),
        city: "Toshkent".to_string(),
        region: "Yunusobod".to_string(),
        phone: "+998901234567".to_string(),
    }
}

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_registration_creates_customer() {
    let pool = test_pool().await;
    let (user, customer) = register(&pool).await;

    assert_eq!(customer.user_id, Some(user.id));
    assert_eq!(customer.first_name, "Aziza");
    assert_eq!(customer.last_name, "Karimova");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_registration_conflicts() {
    let pool = test_pool().await;
    let auth = AuthService::new(&pool);
    let account = new_account();
    auth.register(&account).await.unwrap();

    let mut same_username = new_account();
    same_username.username.clone_from(&account.username);
    assert!(matches!(
        auth.register(&same_username).await,
        Err(AuthError::UsernameTaken)
    ));

    let mut same_email = new_account();
    same_email.email = account.email.clone();
    assert!(matches!(
        auth.register(&same_email).await,
        Err(AuthError::EmailTaken)
    ));
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_cart_totals() {
    let pool = test_pool().await;
    let (user, _) = register(&pool).await;
    let category = create_category(&pool, None).await;
    let ring = create_product(&pool, &category, 10.0).await;
    let chain = create_product(&pool, &category, 5.0).await;

    let cart = CartService::new(&pool);
    cart.add(user.id, ring.id).await.unwrap();
    cart.add(user.id, ring.id).await.unwrap();
    cart.add(user.id, chain.id).await.unwrap();
    cart.add(user.id, chain.id).await.unwrap();
    cart.add(user.id, chain.id).await.unwrap();

    let current = cart.current(user.id).await.unwrap().unwrap();
    assert_eq!(current.lines.len(), 2);
    assert_eq!(current.total_quantity(), 5);
    assert!((current.total_price() - 35.0).abs() < f64::EPSILON);

    assert!(cart.remove(user.id, ring.id).await.unwrap().is_some());
    assert!(cart.remove(user.id, ring.id).await.unwrap().is_none());
    let current = cart.current(user.id).await.unwrap().unwrap();
    assert_eq!(current.lines.len(), 1);
    assert_eq!(current.total_quantity(), 3);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_checkout_closes_order() {
    let pool = test_pool().await;
    let (user, customer) = register(&pool).await;
    let category = create_category(&pool, None).await;
    let product = create_product(&pool, &category, 120.0).await;

    let cart = CartService::new(&pool);
    assert!(matches!(
        cart.checkout(user.id, &address()).await,
        Err(RepositoryError::Conflict(_))
    ));

    cart.add(user.id, product.id).await.unwrap();
    let shipped = cart.checkout(user.id, &address()).await.unwrap();
    assert_eq!(shipped.customer_id, Some(customer.id));
    assert!(shipped.order_id.is_some());

    assert!(cart.current(user.id).await.unwrap().is_none());
    let history = OrderRepository::new(&pool)
        .shipping_addresses(customer.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].city, "Toshkent");

    // The next add starts a new cart.
    cart.add(user.id, product.id).await.unwrap();
    let next = cart.current(user.id).await.unwrap().unwrap();
    assert_ne!(Some(next.order.id), shipped.order_id);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_concurrent_first_adds_share_one_order() {
    let pool = test_pool().await;
    let (_, customer) = register(&pool).await;
    let orders = OrderRepository::new(&pool);

    let (first, second) = tokio::join!(
        orders.get_or_create_open_order(customer.id),
        orders.get_or_create_open_order(customer.id),
    );
    assert_eq!(first.unwrap().id, second.unwrap().id);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM store.order WHERE customer_id = $1")
        .bind(customer.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

// =============================================================================
// Favourites
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_favourites_are_idempotent() {
    let pool = test_pool().await;
    let (user, _) = register(&pool).await;
    let category = create_category(&pool, None).await;
    let product = create_product(&pool, &category, 50.0).await;
    let favourites = FavouriteRepository::new(&pool);

    assert!(favourites.add(user.id, product.id).await.unwrap());
    assert!(!favourites.add(user.id, product.id).await.unwrap());
    assert_eq!(
        favourites.products_for_user(user.id).await.unwrap().len(),
        1
    );

    assert!(!favourites.toggle(user.id, product.id).await.unwrap());
    assert!(!favourites.is_favourite(user.id, product.id).await.unwrap());
    assert!(favourites.toggle(user.id, product.id).await.unwrap());
}

// =============================================================================
// Deletion
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_category_delete_cascades_and_detaches_order_lines() {
    let pool = test_pool().await;
    let (user, _) = register(&pool).await;
    let parent = create_category(&pool, None).await;
    let child = create_category(&pool, Some(&parent)).await;
    let product = create_product(&pool, &child, 99.0).await;

    let products = ProductRepository::new(&pool);
    products.add_image(product.id, "products/a.jpg").await.unwrap();
    ReviewRepository::new(&pool)
        .create(user.id, product.id, "Zo'r")
        .await
        .unwrap();
    FavouriteRepository::new(&pool)
        .add(user.id, product.id)
        .await
        .unwrap();
    let cart = CartService::new(&pool);
    cart.add(user.id, product.id).await.unwrap();

    let report = delete_entity(&pool, Entity::Category, parent.id.as_i32())
        .await
        .unwrap();
    assert_eq!(report.deleted(Entity::Category), 2);
    assert_eq!(report.deleted(Entity::Product), 1);
    assert_eq!(report.deleted(Entity::Gallery), 1);
    assert_eq!(report.deleted(Entity::Review), 1);
    assert_eq!(report.deleted(Entity::FavouriteProduct), 1);
    assert_eq!(report.detached(Entity::OrderProduct), 1);

    let categories = CategoryRepository::new(&pool);
    assert!(categories.get(child.id).await.unwrap().is_none());
    assert!(products.get(product.id).await.unwrap().is_none());

    // The cart keeps the line; it is worth nothing now.
    let current = cart.current(user.id).await.unwrap().unwrap();
    assert_eq!(current.lines.len(), 1);
    assert!(current.lines[0].product.is_none());
    assert!(current.total_price().abs() < f64::EPSILON);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_user_delete_keeps_customer_history() {
    let pool = test_pool().await;
    let (user, customer) = register(&pool).await;
    let category = create_category(&pool, None).await;
    let product = create_product(&pool, &category, 10.0).await;

    let cart = CartService::new(&pool);
    cart.add(user.id, product.id).await.unwrap();
    cart.checkout(user.id, &address()).await.unwrap();

    let report = delete_entity(&pool, Entity::User, user.id.as_i32())
        .await
        .unwrap();
    assert_eq!(report.deleted(Entity::User), 1);
    assert_eq!(report.detached(Entity::Customer), 1);

    let history = OrderRepository::new(&pool)
        .shipping_addresses(customer.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL database"]
async fn test_delete_missing_row() {
    let pool = test_pool().await;
    let result = delete_entity(&pool, Entity::Product, i32::MAX).await;
    assert!(matches!(result, Err(RepositoryError::NotFound)));
}
