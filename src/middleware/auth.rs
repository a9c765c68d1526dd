use actix_web::{dev::ServiceRequest, http::header, web};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;

use crate::config::jwt::JwtSettings;
use crate::models::auth::{Claims, Role};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("No authorization header")]
    MissingHeader,
    #[error("Invalid authorization header format")]
    MalformedHeader,
    #[error("Invalid token")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("Token validation is not configured")]
    NotConfigured,
}

/// Sign a token for `username` valid for the configured lifetime.
pub fn issue_token(
    jwt_settings: &JwtSettings,
    username: &str,
    role: Role,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: username.to_string(),
        username: username.to_string(),
        role,
        iat: now.timestamp() as usize,
        exp: (now + jwt_settings.token_lifetime()).timestamp() as usize,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_settings.secret.expose_secret().as_bytes()),
    )
}

pub fn decode_token(jwt_settings: &JwtSettings, token: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_settings.secret.expose_secret().as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(token_data.claims)
}

/// Claims of the request's bearer token.
pub fn validate_jwt_from_request(req: &ServiceRequest) -> Result<Claims, AuthError> {
    let jwt_settings = req
        .app_data::<web::Data<JwtSettings>>()
        .ok_or(AuthError::NotConfigured)?;

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedHeader)?;

    decode_token(jwt_settings, token.trim()).inspect_err(|e| {
        tracing::warn!("Failed to decode token: {:?}", e);
    })
}
