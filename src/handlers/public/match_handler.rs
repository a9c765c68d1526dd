use actix_web::{web, HttpResponse, Result};
use uuid::Uuid;

use crate::db::helpers::{gateway_result, require_record};
use crate::db::tournament_queries::TournamentQueries;
use crate::models::common::ApiResponse;
use crate::models::matches::MatchQueryParams;
use crate::ok_or_return;

// GET /matches?status=&team_id=
#[tracing::instrument(name = "Get matches", skip(queries, query))]
pub async fn get_matches(
    queries: web::Data<TournamentQueries>,
    query: web::Query<MatchQueryParams>,
) -> Result<HttpResponse> {
    let matches = ok_or_return!(gateway_result(
        queries.get_matches(query.status, query.team_id).await
    ));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Matches retrieved", matches)))
}

// GET /matches/{id}
#[tracing::instrument(name = "Get match detail", skip(queries))]
pub async fn get_match(
    queries: web::Data<TournamentQueries>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let detail = ok_or_return!(require_record(
        queries.get_match_detail(path.into_inner()).await,
        "Match not found"
    ));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Match retrieved", detail)))
}
