use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use reqwest::{Client, Method};
use serde_json::json;

mod common;
use common::utils::{
    login_admin, make_authenticated_request, spawn_app, ADMIN_PASSWORD, ADMIN_USERNAME, JWT_SECRET,
};

fn token_with_role(role: &str, secret: &str) -> String {
    let claims = json!({
        "sub": "someone",
        "username": "someone",
        "role": role,
        "exp": (Utc::now().timestamp() + 3600) as usize,
    });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
}

#[tokio::test]
async fn login_with_admin_credentials_returns_token() {
    let test_app = spawn_app().await;
    let token = login_admin(&test_app.address).await;
    assert_eq!(token.split('.').count(), 3);
}

#[tokio::test]
async fn login_rejects_wrong_password_and_unknown_user() {
    let test_app = spawn_app().await;
    let client = Client::new();

    for (username, password) in [(ADMIN_USERNAME, "not-the-password"), ("intruder", ADMIN_PASSWORD)] {
        let response = client
            .post(format!("{}/login", test_app.address))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Failed to execute login request.");
        assert_eq!(401, response.status().as_u16(), "login as {}", username);
    }
}

#[tokio::test]
async fn admin_routes_require_a_token() {
    let test_app = spawn_app().await;

    let response = Client::new()
        .post(format!("{}/admin/teams", test_app.address))
        .json(&json!({ "name": "Night Owls" }))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    assert!(test_app.gateway.writes().is_empty());
}

#[tokio::test]
async fn admin_routes_reject_forged_and_non_admin_tokens() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let url = format!("{}/admin/teams", test_app.address);
    let body = Some(json!({ "name": "Night Owls" }));

    let forged = token_with_role("admin", "some-other-secret");
    let response = make_authenticated_request(&client, Method::POST, &url, &forged, body.clone()).await;
    assert_eq!(401, response.status().as_u16());

    let viewer = token_with_role("viewer", JWT_SECRET);
    let response = make_authenticated_request(&client, Method::POST, &url, &viewer, body).await;
    assert_eq!(403, response.status().as_u16());

    assert!(test_app.gateway.writes().is_empty());
}

#[tokio::test]
async fn public_routes_need_no_token() {
    let test_app = spawn_app().await;
    let client = Client::new();

    for path in ["/teams", "/players", "/matches"] {
        let response = client
            .get(format!("{}{}", test_app.address, path))
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(200, response.status().as_u16(), "GET {}", path);
    }
}

#[tokio::test]
async fn rejections_use_the_api_envelope() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let url = format!("{}/admin/teams", test_app.address);

    let response = client.post(&url).json(&json!({ "name": "Night Owls" })).send().await.unwrap();
    assert_eq!(401, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "No authorization header");

    let viewer = token_with_role("viewer", JWT_SECRET);
    let response = make_authenticated_request(&client, Method::POST, &url, &viewer, Some(json!({ "name": "Night Owls" }))).await;
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Insufficient privileges");
}

#[tokio::test]
async fn login_reports_token_type_and_lifetime() {
    let test_app = spawn_app().await;

    let response = Client::new()
        .post(format!("{}/login", test_app.address))
        .json(&json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }))
        .send()
        .await
        .unwrap();

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["token_type"], "Bearer");
    // Test apps issue one-hour tokens
    assert_eq!(body["expires_in"], 3600);
}
