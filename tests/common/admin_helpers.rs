use reqwest::{Client, Method};
use serde_json::{json, Value};

use crate::common::utils::make_authenticated_request;

/// Create a team through the admin API and return it
pub async fn create_team(client: &Client, app_address: &str, token: &str, name: &str) -> Value {
    let response = make_authenticated_request(
        client,
        Method::POST,
        &format!("{}/admin/teams", app_address),
        token,
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(201, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse team response");
    body["data"].clone()
}

/// Create a player, optionally signed to a team, and return it
pub async fn create_player(
    client: &Client,
    app_address: &str,
    token: &str,
    name: &str,
    team_id: Option<&str>,
) -> Value {
    let response = make_authenticated_request(
        client,
        Method::POST,
        &format!("{}/admin/players", app_address),
        token,
        Some(json!({ "name": name, "team_id": team_id })),
    )
    .await;
    assert_eq!(201, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse player response");
    body["data"].clone()
}

/// Sign `size` players to a team, named after the team
pub async fn create_roster(
    client: &Client,
    app_address: &str,
    token: &str,
    team: &Value,
    size: usize,
) -> Vec<Value> {
    let team_id = team["id"].as_str().expect("team without id");
    let team_name = team["name"].as_str().unwrap_or("team");
    let mut roster = Vec::with_capacity(size);
    for n in 1..=size {
        roster.push(create_player(client, app_address, token, &format!("{} #{}", team_name, n), Some(team_id)).await);
    }
    roster
}

/// Schedule one match between two teams and return `{ match, maps }`
pub async fn schedule_match(
    client: &Client,
    app_address: &str,
    token: &str,
    team1: &Value,
    team2: &Value,
    map_count: u32,
) -> Value {
    let response = make_authenticated_request(
        client,
        Method::POST,
        &format!("{}/admin/matches/schedule", app_address),
        token,
        Some(json!({
            "matches": [{
                "team1_id": team1["id"],
                "team2_id": team2["id"],
                "scheduled_at": "2026-11-07T18:00:00Z"
            }],
            "map_count": map_count
        })),
    )
    .await;
    assert_eq!(201, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse schedule response");
    body["data"][0].clone()
}

/// Load the editable draft of a match
pub async fn get_draft(client: &Client, app_address: &str, token: &str, match_id: &str) -> Value {
    let response = make_authenticated_request(
        client,
        Method::GET,
        &format!("{}/admin/matches/{}/draft", app_address, match_id),
        token,
        None,
    )
    .await;
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.expect("Failed to parse draft response");
    body["data"].clone()
}

/// Submit a draft and return the full response body
pub async fn submit_draft(
    client: &Client,
    app_address: &str,
    token: &str,
    match_id: &str,
    draft: &Value,
) -> (u16, Value) {
    let response = make_authenticated_request(
        client,
        Method::PUT,
        &format!("{}/admin/matches/{}/draft", app_address, match_id),
        token,
        Some(draft.clone()),
    )
    .await;
    let status = response.status().as_u16();
    let body: Value = response.json().await.expect("Failed to parse submit response");
    (status, body)
}
