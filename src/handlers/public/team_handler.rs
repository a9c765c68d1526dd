use actix_web::{web, HttpResponse, Result};
use uuid::Uuid;

use crate::db::helpers::{gateway_result, require_record};
use crate::db::tournament_queries::TournamentQueries;
use crate::models::common::ApiResponse;
use crate::models::team::TeamDetail;
use crate::ok_or_return;
use crate::services::StandingsService;

// GET /teams - leaderboard
#[tracing::instrument(name = "Get standings", skip(standings))]
pub async fn get_standings(standings: web::Data<StandingsService>) -> Result<HttpResponse> {
    let table = ok_or_return!(gateway_result(standings.standings().await));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Standings retrieved", table)))
}

// GET /teams/{id}
#[tracing::instrument(name = "Get team detail", skip(queries, standings))]
pub async fn get_team(
    queries: web::Data<TournamentQueries>,
    standings: web::Data<StandingsService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let team_id = path.into_inner();
    let team = ok_or_return!(require_record(queries.get_team(team_id).await, "Team not found"));
    let roster = ok_or_return!(gateway_result(queries.get_roster(team_id).await));
    let standing = ok_or_return!(gateway_result(standings.team_standing(team_id).await));

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Team retrieved",
        TeamDetail { team, roster, standing },
    )))
}
