use reqwest::Client;
use serde_json::{json, Value};
use uuid::Uuid;

use tournament_backend::db::gateway::{Entity, PersistenceGateway};

mod common;
use common::utils::{spawn_app, TestApp};

async fn insert(app: &TestApp, entity: Entity, row: Value) -> Value {
    app.gateway
        .insert(entity, vec![row])
        .await
        .expect("Failed to seed row")
        .remove(0)
}

async fn team(app: &TestApp, name: &str) -> Value {
    insert(app, Entity::Teams, json!({ "name": name })).await
}

async fn player(app: &TestApp, name: &str, team: &Value) -> Value {
    insert(app, Entity::Players, json!({ "name": name, "team_id": team["id"] })).await
}

/// Match with one map per score pair; the match score is derived from the maps
async fn played_match(
    app: &TestApp,
    team1: &Value,
    team2: &Value,
    status: &str,
    scheduled_at: &str,
    maps: &[(u32, u32)],
) -> (Value, Vec<Value>) {
    let team1_score = maps.iter().filter(|(a, b)| a > b).count();
    let team2_score = maps.iter().filter(|(a, b)| b > a).count();
    let match_row = insert(
        app,
        Entity::Matches,
        json!({
            "team1_id": team1["id"],
            "team2_id": team2["id"],
            "scheduled_at": scheduled_at,
            "status": status,
            "team1_score": team1_score,
            "team2_score": team2_score,
            "map_count": maps.len()
        }),
    )
    .await;

    let mut stored = Vec::new();
    for (index, (score1, score2)) in maps.iter().enumerate() {
        let winner = match score1.cmp(score2) {
            std::cmp::Ordering::Greater => team1["id"].clone(),
            std::cmp::Ordering::Less => team2["id"].clone(),
            std::cmp::Ordering::Equal => Value::Null,
        };
        stored.push(
            insert(
                app,
                Entity::MatchMaps,
                json!({
                    "match_id": match_row["id"],
                    "map_number": index + 1,
                    "team1_score": score1,
                    "team2_score": score2,
                    "winner_id": winner,
                    "status": status
                }),
            )
            .await,
        );
    }
    (match_row, stored)
}

async fn stat(app: &TestApp, map: &Value, player: &Value, kills: u32, deaths: u32, assists: u32) {
    insert(
        app,
        Entity::MapPlayerStats,
        json!({
            "map_id": map["id"],
            "player_id": player["id"],
            "team_id": player["team_id"],
            "kills": kills,
            "deaths": deaths,
            "assists": assists
        }),
    )
    .await;
}

async fn get_data(client: &Client, url: String) -> Value {
    let response = client.get(url).send().await.expect("Failed to execute request.");
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.expect("Failed to parse response");
    body["data"].clone()
}

#[tokio::test]
async fn standings_count_completed_matches_only() {
    let app = spawn_app().await;
    let client = Client::new();
    let owls = team(&app, "Night Owls").await;
    let foxes = team(&app, "Red Foxes").await;
    let bears = team(&app, "Brown Bears").await;

    played_match(&app, &owls, &foxes, "completed", "2026-11-01T18:00:00Z", &[(13, 5), (13, 7)]).await;
    played_match(&app, &foxes, &bears, "completed", "2026-11-02T18:00:00Z", &[(13, 10), (8, 13)]).await;
    played_match(&app, &owls, &bears, "scheduled", "2026-11-09T18:00:00Z", &[(0, 0), (0, 0)]).await;

    let standings = get_data(&client, format!("{}/teams", app.address)).await;
    let standings = standings.as_array().unwrap();

    let names: Vec<&str> = standings.iter().map(|s| s["team_name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Night Owls", "Brown Bears", "Red Foxes"]);
    let positions: Vec<u64> = standings.iter().map(|s| s["position"].as_u64().unwrap()).collect();
    assert_eq!(positions, vec![1, 2, 3]);

    let owls_row = &standings[0];
    assert_eq!(owls_row["matches_played"], 1);
    assert_eq!(owls_row["wins"], 1);
    assert_eq!((owls_row["rounds_won"].as_u64(), owls_row["rounds_lost"].as_u64()), (Some(26), Some(12)));

    // The drawn match counts as played without a win or a loss
    let foxes_row = &standings[2];
    assert_eq!(foxes_row["matches_played"], 2);
    assert_eq!(foxes_row["wins"], 0);
    assert_eq!(foxes_row["losses"], 1);
    assert_eq!((foxes_row["rounds_won"].as_u64(), foxes_row["rounds_lost"].as_u64()), (Some(33), Some(49)));

    let bears_row = &standings[1];
    assert_eq!(bears_row["matches_played"], 1);
    assert_eq!(bears_row["losses"], 0);
}

#[tokio::test]
async fn team_page_has_roster_and_standing() {
    let app = spawn_app().await;
    let client = Client::new();
    let owls = team(&app, "Night Owls").await;
    let foxes = team(&app, "Red Foxes").await;
    player(&app, "hoot", &owls).await;
    player(&app, "talon", &owls).await;
    player(&app, "ember", &foxes).await;
    played_match(&app, &owls, &foxes, "completed", "2026-11-01T18:00:00Z", &[(13, 5), (11, 13), (13, 9)]).await;

    let detail = get_data(&client, format!("{}/teams/{}", app.address, owls["id"].as_str().unwrap())).await;

    assert_eq!(detail["team"]["name"], "Night Owls");
    let roster: Vec<&str> = detail["roster"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(roster, vec!["hoot", "talon"]);
    assert_eq!(detail["standing"]["wins"], 1);
    assert_eq!(detail["standing"]["position"], 1);

    let response = client
        .get(format!("{}/teams/{}", app.address, Uuid::new_v4()))
        .send()
        .await
        .unwrap();
    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn player_careers_are_ranked_by_kd_then_kills() {
    let app = spawn_app().await;
    let client = Client::new();
    let owls = team(&app, "Night Owls").await;
    let foxes = team(&app, "Red Foxes").await;
    let hoot = player(&app, "hoot", &owls).await;
    let ember = player(&app, "ember", &foxes).await;
    let bench = player(&app, "bench", &foxes).await;
    let (_, maps) =
        played_match(&app, &owls, &foxes, "completed", "2026-11-01T18:00:00Z", &[(13, 5), (13, 7)]).await;

    stat(&app, &maps[0], &hoot, 20, 10, 4).await;
    stat(&app, &maps[1], &hoot, 10, 5, 1).await;
    stat(&app, &maps[0], &ember, 15, 0, 2).await;

    let careers = get_data(&client, format!("{}/players", app.address)).await;
    let careers = careers.as_array().unwrap();

    let names: Vec<&str> = careers.iter().map(|c| c["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["ember", "hoot", "bench"]);
    // No deaths: the ratio is the kill count
    assert_eq!(careers[0]["kd_ratio"], 15.0);
    assert_eq!(careers[1]["kills"], 30);
    assert_eq!(careers[1]["deaths"], 15);
    assert_eq!(careers[1]["assists"], 5);
    assert_eq!(careers[1]["maps_played"], 2);
    assert_eq!(careers[1]["kd_ratio"], 2.0);
    assert_eq!(careers[2]["maps_played"], 0);
    assert_eq!(careers[2]["kd_ratio"], 0.0);

    let career = get_data(&client, format!("{}/players/{}", app.address, bench["id"].as_str().unwrap())).await;
    assert_eq!(career["name"], "bench");
    assert_eq!(career["team_id"], foxes["id"]);

    let response = client
        .get(format!("{}/players/{}", app.address, Uuid::new_v4()))
        .send()
        .await
        .unwrap();
    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn match_page_has_teams_maps_and_stats() {
    let app = spawn_app().await;
    let client = Client::new();
    let owls = team(&app, "Night Owls").await;
    let foxes = team(&app, "Red Foxes").await;
    let hoot = player(&app, "hoot", &owls).await;
    let ember = player(&app, "ember", &foxes).await;
    let (match_row, maps) =
        played_match(&app, &owls, &foxes, "completed", "2026-11-01T18:00:00Z", &[(13, 5), (9, 13), (16, 14)]).await;
    stat(&app, &maps[1], &hoot, 12, 14, 3).await;
    stat(&app, &maps[1], &ember, 19, 9, 6).await;

    let detail = get_data(&client, format!("{}/matches/{}", app.address, match_row["id"].as_str().unwrap())).await;

    assert_eq!(detail["match"]["team1_score"], 2);
    assert_eq!(detail["match"]["team2_score"], 1);
    assert_eq!(detail["team1"]["name"], "Night Owls");
    assert_eq!(detail["team2"]["name"], "Red Foxes");
    let maps = detail["maps"].as_array().unwrap();
    let numbers: Vec<u64> = maps.iter().map(|m| m["map"]["map_number"].as_u64().unwrap()).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(maps[1]["map"]["winner_id"], foxes["id"]);
    assert!(maps[0]["stats"].as_array().unwrap().is_empty());
    assert_eq!(maps[1]["stats"].as_array().unwrap().len(), 2);

    let response = client
        .get(format!("{}/matches/{}", app.address, Uuid::new_v4()))
        .send()
        .await
        .unwrap();
    assert_eq!(404, response.status().as_u16());
}

#[tokio::test]
async fn match_list_filters_by_status_and_team() {
    let app = spawn_app().await;
    let client = Client::new();
    let owls = team(&app, "Night Owls").await;
    let foxes = team(&app, "Red Foxes").await;
    let bears = team(&app, "Brown Bears").await;
    played_match(&app, &foxes, &bears, "scheduled", "2026-11-09T18:00:00Z", &[(0, 0), (0, 0)]).await;
    played_match(&app, &owls, &foxes, "completed", "2026-11-01T18:00:00Z", &[(13, 5), (13, 7)]).await;
    played_match(&app, &owls, &bears, "scheduled", "2026-11-05T18:00:00Z", &[(0, 0), (0, 0)]).await;

    let all = get_data(&client, format!("{}/matches", app.address)).await;
    let dates: Vec<&str> = all
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["scheduled_at"].as_str().unwrap())
        .collect();
    assert_eq!(dates, vec!["2026-11-01T18:00:00Z", "2026-11-05T18:00:00Z", "2026-11-09T18:00:00Z"]);

    let scheduled = get_data(&client, format!("{}/matches?status=scheduled", app.address)).await;
    assert_eq!(scheduled.as_array().unwrap().len(), 2);

    let owls_matches = get_data(
        &client,
        format!("{}/matches?team_id={}", app.address, owls["id"].as_str().unwrap()),
    )
    .await;
    assert_eq!(owls_matches.as_array().unwrap().len(), 2);

    let owls_scheduled = get_data(
        &client,
        format!("{}/matches?status=scheduled&team_id={}", app.address, owls["id"].as_str().unwrap()),
    )
    .await;
    let owls_scheduled = owls_scheduled.as_array().unwrap();
    assert_eq!(owls_scheduled.len(), 1);
    assert_eq!(owls_scheduled[0]["team2_id"], bears["id"]);
}
