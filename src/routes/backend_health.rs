use actix_web::web;

use crate::handlers::backend_health_handler::backend_health_check;

/// Liveness probe for load balancers; never touches the store
pub fn init_health_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/backend_health")
            .route(web::get().to(backend_health_check))
            .route(web::head().to(backend_health_check)),
    );
}
