use actix_web::{http::header, web, HttpResponse, Result};

use crate::models::common::ApiResponse;
use crate::services::MinIOService;

// GET /media/{key:.*}
#[tracing::instrument(name = "Serve media", skip(storage))]
pub async fn serve_media(
    storage: Option<web::Data<MinIOService>>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let object_key = path.into_inner();
    let Some(storage) = storage else {
        return Ok(HttpResponse::NotFound().json(ApiResponse::<()>::error("Media not found")));
    };

    if object_key.split('/').any(|segment| segment == "..") {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error("Invalid media path")));
    }

    match storage.get_file(&object_key).await {
        Ok((bytes, content_type)) => Ok(HttpResponse::Ok()
            .content_type(content_type)
            .insert_header((header::CACHE_CONTROL, "public, max-age=86400"))
            .body(bytes)),
        Err(_) => Ok(HttpResponse::NotFound().json(ApiResponse::<()>::error("Media not found"))),
    }
}
