use actix_web::{post, web, HttpResponse};

use crate::config::jwt::JwtSettings;
use crate::config::settings::AdminSettings;
use crate::handlers::auth_handler::login_admin;
use crate::models::auth::LoginRequest;

#[post("/login")]
async fn login(
    login_form: web::Json<LoginRequest>,
    admin: web::Data<AdminSettings>,
    jwt_settings: web::Data<JwtSettings>,
) -> HttpResponse {
    login_admin(login_form, admin, jwt_settings).await
}
