use reqwest::Client;

mod common;
use common::utils::spawn_app;

#[tokio::test]
async fn backend_health_reports_up_without_credentials() {
    let test_app = spawn_app().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/backend_health", &test_app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(response.status().is_success());

    let json_response: serde_json::Value = response.json().await.expect("Cannot turn into a json.");
    assert_eq!(json_response, serde_json::json!({ "status": "UP" }));
}

#[tokio::test]
async fn backend_health_does_not_touch_the_store() {
    let test_app = spawn_app().await;

    Client::new()
        .get(format!("{}/backend_health", &test_app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert!(test_app.gateway.operations().is_empty());
}

#[tokio::test]
async fn backend_health_answers_head_probes() {
    let test_app = spawn_app().await;

    let response = Client::new()
        .head(format!("{}/backend_health", &test_app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(200, response.status().as_u16());
}
