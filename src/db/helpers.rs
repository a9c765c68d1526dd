//! Helpers that turn gateway results into handler responses.
//!
//! These helpers simplify common patterns like:
//! - Fetching a required record (NotFound if missing)
//! - Mapping store errors to the right status code
//!
//! # Usage
//!
//! For handlers returning `Result<HttpResponse>`:
//! ```ignore
//! let team = ok_or_return!(require_record(find_record::<Team>(gw, id).await, "Team not found"));
//! ```

use actix_web::HttpResponse;

use crate::db::gateway::GatewayError;
use crate::models::common::ApiResponse;

/// Macro for handlers returning `Result<HttpResponse>`.
/// Converts a `DbResult<T>` to return `Ok(error_response)` on error.
#[macro_export]
macro_rules! ok_or_return {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(response) => return Ok(response),
        }
    };
}

/// Result type for gateway operations that return an HttpResponse on error
pub type DbResult<T> = Result<T, HttpResponse>;

/// Map a gateway error to the response the admin console expects.
pub fn gateway_error_response(error: &GatewayError) -> HttpResponse {
    match error {
        GatewayError::NotFound { .. } => {
            HttpResponse::NotFound().json(ApiResponse::<()>::error("Record not found"))
        }
        GatewayError::Constraint { detail, .. } => {
            tracing::warn!("Constraint violation: {}", detail);
            HttpResponse::Conflict().json(ApiResponse::<()>::error(
                "Operation conflicts with existing data",
            ))
        }
        other => {
            tracing::error!("Gateway error: {}", other);
            HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Database error"))
        }
    }
}

/// Unwrap an optional gateway result, returning NotFound if None.
pub fn require_record<T>(
    result: Result<Option<T>, GatewayError>,
    not_found_message: &str,
) -> DbResult<T> {
    match result {
        Ok(Some(record)) => Ok(record),
        Ok(None) => Err(HttpResponse::NotFound().json(ApiResponse::<()>::error(not_found_message))),
        Err(e) => Err(gateway_error_response(&e)),
    }
}

/// Unwrap a gateway result, mapping the error to a response.
pub fn gateway_result<T>(result: Result<T, GatewayError>) -> DbResult<T> {
    result.map_err(|e| gateway_error_response(&e))
}
