use actix_web::{web, HttpResponse, Result};
use uuid::Uuid;

use crate::db::helpers::{gateway_result, require_record};
use crate::models::common::ApiResponse;
use crate::ok_or_return;
use crate::services::StandingsService;

// GET /players - career leaderboard
#[tracing::instrument(name = "Get player careers", skip(standings))]
pub async fn get_players(standings: web::Data<StandingsService>) -> Result<HttpResponse> {
    let careers = ok_or_return!(gateway_result(standings.careers().await));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Players retrieved", careers)))
}

// GET /players/{id}
#[tracing::instrument(name = "Get player career", skip(standings))]
pub async fn get_player(
    standings: web::Data<StandingsService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let career = ok_or_return!(require_record(
        standings.career(path.into_inner()).await,
        "Player not found"
    ));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Player retrieved", career)))
}
