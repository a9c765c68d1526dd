use actix_web::{web, HttpResponse, Result};
use uuid::Uuid;

use crate::db::gateway::{find_record, insert_records, update_record, Entity, PersistenceGateway};
use crate::db::helpers::{gateway_error_response, gateway_result, require_record, DbResult};
use crate::models::common::ApiResponse;
use crate::models::player::{CreatePlayerRequest, Player, UpdatePlayerRequest};
use crate::models::team::Team;
use crate::ok_or_return;

/// 400 when a player is pointed at a team that does not exist
async fn check_team(gateway: &dyn PersistenceGateway, team_id: Option<Uuid>) -> DbResult<()> {
    let Some(team_id) = team_id else {
        return Ok(());
    };
    match gateway_result(find_record::<Team>(gateway, team_id).await)? {
        Some(_) => Ok(()),
        None => Err(HttpResponse::BadRequest().json(ApiResponse::<()>::error("Team not found"))),
    }
}

// POST /admin/players
#[tracing::instrument(name = "Admin create player", skip(gateway, body), fields(name = %body.name))]
pub async fn create_player(
    gateway: web::Data<dyn PersistenceGateway>,
    body: web::Json<CreatePlayerRequest>,
) -> Result<HttpResponse> {
    if let Err(message) = body.validate() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(message)));
    }
    ok_or_return!(check_team(gateway.get_ref(), body.team_id).await);

    let new_player = body.into_inner().into_new_player();
    let mut created = ok_or_return!(gateway_result(
        insert_records::<Player, _>(gateway.get_ref(), &[new_player]).await
    ));

    match created.pop() {
        Some(player) => Ok(HttpResponse::Created().json(ApiResponse::success("Player created", player))),
        None => Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Failed to create player"))),
    }
}

// PATCH /admin/players/{id}
//
// `"team_id": null` releases the player from their team.
#[tracing::instrument(name = "Admin update player", skip(gateway, body))]
pub async fn update_player(
    gateway: web::Data<dyn PersistenceGateway>,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePlayerRequest>,
) -> Result<HttpResponse> {
    let player_id = path.into_inner();
    if let Err(message) = body.validate() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(message)));
    }
    ok_or_return!(check_team(gateway.get_ref(), body.team_id.flatten()).await);

    let mut patch = body.into_inner();
    patch.name = patch.name.map(|n| n.trim().to_string());
    ok_or_return!(gateway_result(
        update_record(gateway.get_ref(), Entity::Players, player_id, &patch).await
    ));

    let player = ok_or_return!(require_record(
        find_record::<Player>(gateway.get_ref(), player_id).await,
        "Player not found"
    ));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Player updated", player)))
}

// DELETE /admin/players/{id}
//
// The player's stat lines go with them.
#[tracing::instrument(name = "Admin delete player", skip(gateway))]
pub async fn delete_player(
    gateway: web::Data<dyn PersistenceGateway>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let player_id = path.into_inner();
    match gateway.delete(Entity::Players, player_id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_message("Player deleted"))),
        Err(e) => Ok(gateway_error_response(&e)),
    }
}
