use actix_web::web;

use crate::handlers::public::{match_handler, media_handler, player_handler, team_handler};

pub fn init_public_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/teams")
            .route(web::get().to(team_handler::get_standings))
    )
    .service(
        web::resource("/teams/{id}")
            .route(web::get().to(team_handler::get_team))
    )
    .service(
        web::resource("/players")
            .route(web::get().to(player_handler::get_players))
    )
    .service(
        web::resource("/players/{id}")
            .route(web::get().to(player_handler::get_player))
    )
    .service(
        web::resource("/matches")
            .route(web::get().to(match_handler::get_matches))
    )
    .service(
        web::resource("/matches/{id}")
            .route(web::get().to(match_handler::get_match))
    )
    .service(
        web::resource("/media/{key:.*}")
            .route(web::get().to(media_handler::serve_media))
    );
}
