use reqwest::{Client, Method};
use serde_json::{json, Value};
use uuid::Uuid;

use tournament_backend::db::gateway::Entity;

mod common;
use common::admin_helpers::{create_player, create_team};
use common::utils::{login_admin, make_authenticated_request, spawn_app};

#[tokio::test]
async fn admin_create_player_signs_them_to_a_team() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let token = login_admin(&test_app.address).await;
    let team = create_team(&client, &test_app.address, &token, "Night Owls").await;

    let player = create_player(&client, &test_app.address, &token, " hoot ", team["id"].as_str()).await;

    assert_eq!(player["name"], "hoot");
    assert_eq!(player["team_id"], team["id"]);

    let detail: Value = client
        .get(format!("{}/teams/{}", test_app.address, team["id"].as_str().unwrap()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["data"]["roster"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn admin_create_player_for_unknown_team_is_rejected() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let token = login_admin(&test_app.address).await;

    let response = make_authenticated_request(
        &client,
        Method::POST,
        &format!("{}/admin/players", test_app.address),
        &token,
        Some(json!({ "name": "drifter", "team_id": Uuid::new_v4() })),
    )
    .await;

    assert_eq!(400, response.status().as_u16());
    assert!(test_app.gateway.rows(Entity::Players).is_empty());
}

#[tokio::test]
async fn admin_update_player_with_null_team_makes_a_free_agent() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let token = login_admin(&test_app.address).await;
    let team = create_team(&client, &test_app.address, &token, "Night Owls").await;
    let player = create_player(&client, &test_app.address, &token, "hoot", team["id"].as_str()).await;
    let url = format!("{}/admin/players/{}", test_app.address, player["id"].as_str().unwrap());

    // Absent team_id leaves the membership alone
    let response = make_authenticated_request(&client, Method::PATCH, &url, &token, Some(json!({ "role": "entry" }))).await;
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["team_id"], team["id"]);
    assert_eq!(body["data"]["role"], "entry");

    let response = make_authenticated_request(&client, Method::PATCH, &url, &token, Some(json!({ "team_id": null }))).await;
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert!(body["data"]["team_id"].is_null());
    assert_eq!(body["data"]["role"], "entry");
}

#[tokio::test]
async fn admin_update_player_requires_a_field() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let token = login_admin(&test_app.address).await;
    let player = create_player(&client, &test_app.address, &token, "hoot", None).await;

    let response = make_authenticated_request(
        &client,
        Method::PATCH,
        &format!("{}/admin/players/{}", test_app.address, player["id"].as_str().unwrap()),
        &token,
        Some(json!({})),
    )
    .await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn admin_delete_player_twice_returns_404() {
    let test_app = spawn_app().await;
    let client = Client::new();
    let token = login_admin(&test_app.address).await;
    let player = create_player(&client, &test_app.address, &token, "hoot", None).await;
    let url = format!("{}/admin/players/{}", test_app.address, player["id"].as_str().unwrap());

    let first = make_authenticated_request(&client, Method::DELETE, &url, &token, None).await;
    assert_eq!(200, first.status().as_u16());

    let second = make_authenticated_request(&client, Method::DELETE, &url, &token, None).await;
    assert_eq!(404, second.status().as_u16());
}
