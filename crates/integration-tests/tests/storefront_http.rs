//! HTTP tests against a running storefront.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`bozor-cli migrate`)
//! - The storefront running (`cargo run -p bozor-storefront`)
//!
//! Run with: cargo test -p bozor-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::expect_used)]

use bozor_integration_tests::{storefront_base_url, unique};
use reqwest::{Client, StatusCode, redirect::Policy};

/// Client that keeps cookies and does not follow redirects.
fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

fn location(resp: &reqwest::Response) -> &str {
    resp.headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

async fn register(client: &Client, username: &str) -> reqwest::Response {
    let base_url = storefront_base_url();
    let email = format!("{username}@example.uz");
    client
        .post(format!("{base_url}/auth/register"))
        .form(&[
            ("username", username),
            ("first_name", "Aziza"),
            ("last_name", "Karimova"),
            ("email", email.as_str()),
            ("password1", "kumush-uzuk-2026"),
            ("password2", "kumush-uzuk-2026"),
        ])
        .send()
        .await
        .expect("Failed to send registration")
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health_endpoints() {
    let base_url = storefront_base_url();
    let client = client();

    let resp = client.get(format!("{base_url}/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));

    let resp = client
        .get(format!("{base_url}/health/ready"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_home_page_renders() {
    let resp = client()
        .get(format!("{}/", storefront_base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("Kategoriyalar"));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_anonymous_cart_redirects_to_login() {
    let resp = client()
        .get(format!("{}/cart", storefront_base_url()))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_redirection());
    assert_eq!(location(&resp), "/auth/login");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_unknown_category_is_404() {
    let resp = client()
        .get(format!("{}/categories/{}", storefront_base_url(), unique("missing")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_register_login_logout() {
    let base_url = storefront_base_url();
    let client = client();
    let username = unique("user").replace('-', "_");

    let resp = register(&client, &username).await;
    assert!(resp.status().is_redirection());
    assert_eq!(location(&resp), "/");

    let resp = client.get(format!("{base_url}/cart")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("{base_url}/auth/logout"))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_redirection());

    let resp = client
        .post(format!("{base_url}/auth/login"))
        .form(&[("username", username.as_str()), ("password", "wrong-password")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp.text().await.unwrap().contains("correct username and password"));

    let resp = client
        .post(format!("{base_url}/auth/login"))
        .form(&[("username", username.as_str()), ("password", "kumush-uzuk-2026")])
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_redirection());
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_duplicate_username_is_rejected() {
    let username = unique("user").replace('-', "_");
    assert!(register(&client(), &username).await.status().is_redirection());

    let resp = register(&client(), &username).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        resp.text()
            .await
            .unwrap()
            .contains("A user with that username already exists.")
    );
}
