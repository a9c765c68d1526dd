use actix_web::{web, HttpResponse};
use secrecy::ExposeSecret;

use crate::config::jwt::JwtSettings;
use crate::config::settings::AdminSettings;
use crate::middleware::auth::issue_token;
use crate::models::auth::{LoginRequest, LoginResponse, Role};
use crate::models::common::ApiResponse;
use crate::utils::password::verify_password;

#[tracing::instrument(
    name = "Admin login attempt",
    skip(login_form, admin, jwt_settings),
    fields(
        username = %login_form.username
    )
)]
pub async fn login_admin(
    login_form: web::Json<LoginRequest>,
    admin: web::Data<AdminSettings>,
    jwt_settings: web::Data<JwtSettings>,
) -> HttpResponse {
    // Hash is checked whatever the username
    let password_ok = verify_password(
        login_form.password.expose_secret(),
        admin.password_hash.expose_secret(),
    );
    if login_form.username != admin.username || !password_ok {
        tracing::info!("Invalid admin credentials");
        return HttpResponse::Unauthorized()
            .json(ApiResponse::<()>::error("Invalid username or password"));
    }

    match issue_token(&jwt_settings, &admin.username, Role::Admin) {
        Ok(token) => HttpResponse::Ok().json(LoginResponse::bearer(
            token,
            jwt_settings.token_lifetime().num_seconds(),
        )),
        Err(e) => {
            tracing::error!("Error generating JWT token: {:?}", e);
            HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Failed to issue token"))
        }
    }
}
