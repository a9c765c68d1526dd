use actix_web::web;

pub mod admin;
pub mod auth;
pub mod backend_health;
pub mod public;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    backend_health::init_health_routes(cfg);
    cfg.service(auth::login);

    public::init_public_routes(cfg);
    admin::init_admin_routes(cfg);
}
