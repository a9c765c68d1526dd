use actix_web::web;

use crate::handlers::admin::{match_handler, player_handler, team_handler};
use crate::middleware::role::RequireRole;

pub fn init_admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .wrap(RequireRole::admin())
            // Team management routes
            .service(
                web::resource("/teams")
                    .route(web::post().to(team_handler::create_team))
            )
            .service(
                web::resource("/teams/{id}")
                    .route(web::patch().to(team_handler::update_team))
                    .route(web::delete().to(team_handler::delete_team))
            )
            .service(
                web::resource("/teams/{id}/logo")
                    .route(web::post().to(team_handler::upload_logo))
            )

            // Player management routes
            .service(
                web::resource("/players")
                    .route(web::post().to(player_handler::create_player))
            )
            .service(
                web::resource("/players/{id}")
                    .route(web::patch().to(player_handler::update_player))
                    .route(web::delete().to(player_handler::delete_player))
            )

            // Match management routes
            .service(
                web::resource("/matches/schedule")
                    .route(web::post().to(match_handler::schedule_matches))
            )
            .service(
                web::resource("/matches/{id}")
                    .route(web::delete().to(match_handler::delete_match))
            )
            .service(
                web::resource("/matches/{id}/draft")
                    .route(web::get().to(match_handler::get_draft))
                    .route(web::put().to(match_handler::submit_draft))
            )
            .service(
                web::resource("/matches/{id}/draft/preview")
                    .route(web::post().to(match_handler::preview_draft))
            )
            .service(
                web::resource("/matches/{id}/maps/{map_id}")
                    .route(web::delete().to(match_handler::delete_map))
            )
    );
}
