use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::{http, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

pub mod config;
pub mod db;
mod handlers;
mod middleware;
pub mod models;
pub mod reconcile;
mod routes;
pub mod services;
pub mod telemetry;
pub mod utils;

use crate::config::jwt::JwtSettings;
use crate::config::settings::AdminSettings;
use crate::db::{PersistenceGateway, TournamentQueries};
use crate::routes::init_routes;
use crate::services::{MatchEditorService, MinIOService, StandingsService};

pub fn run(
    listener: TcpListener,
    gateway: Arc<dyn PersistenceGateway>,
    jwt_settings: JwtSettings,
    admin_settings: AdminSettings,
    minio_service: Option<MinIOService>,
    allowed_origins: Vec<String>,
) -> Result<Server, std::io::Error> {
    // Wrap using web::Data, which boils down to an Arc smart pointer
    let queries = TournamentQueries::new(gateway.clone());
    let editor_data = web::Data::new(MatchEditorService::new(gateway.clone()));
    let standings_data = web::Data::new(StandingsService::new(queries.clone()));
    let queries_data = web::Data::new(queries);
    let gateway_data: web::Data<dyn PersistenceGateway> = web::Data::from(gateway);
    let jwt_settings = web::Data::new(jwt_settings);
    let admin_settings = web::Data::new(admin_settings);
    let minio_service_data = minio_service.map(web::Data::new);

    let server = HttpServer::new(move || {
        let cors = allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "PATCH"])
            .allowed_headers(vec![
                http::header::AUTHORIZATION,
                http::header::ACCEPT,
                http::header::CONTENT_TYPE,
            ])
            .supports_credentials()
            .max_age(3600);

        let mut app = App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            // Get a pointer copy and attach it to the application state
            .app_data(gateway_data.clone())
            .app_data(queries_data.clone())
            .app_data(editor_data.clone())
            .app_data(standings_data.clone())
            .app_data(jwt_settings.clone())
            .app_data(admin_settings.clone());
        // Logo upload and media serving answer 503 / 404 without storage
        if let Some(minio) = &minio_service_data {
            app = app.app_data(minio.clone());
        }

        app.configure(init_routes)
    })
    .listen(listener)?
    .run();

    Ok(server)
}
