use actix_multipart::form::{tempfile::TempFile, MultipartForm};
use actix_web::{web, HttpResponse, Result};
use bytes::Bytes;
use uuid::Uuid;

use crate::db::gateway::{find_record, insert_records, update_record, Entity, PersistenceGateway};
use crate::db::helpers::{gateway_error_response, gateway_result, require_record};
use crate::models::common::ApiResponse;
use crate::models::team::{CreateTeamRequest, Team, UpdateTeamRequest};
use crate::ok_or_return;
use crate::services::minio_service::{media_url, object_key_from_url};
use crate::services::MinIOService;

const ALLOWED_LOGO_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg"];
const MAX_LOGO_SIZE: usize = 2 * 1024 * 1024; // 2MB

#[derive(Debug, MultipartForm)]
pub struct LogoUploadForm {
    #[multipart(limit = "2MB")]
    pub file: TempFile,
}

// POST /admin/teams
#[tracing::instrument(name = "Admin create team", skip(gateway, body), fields(name = %body.name))]
pub async fn create_team(
    gateway: web::Data<dyn PersistenceGateway>,
    body: web::Json<CreateTeamRequest>,
) -> Result<HttpResponse> {
    if let Err(message) = body.validate() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(message)));
    }

    let new_team = body.into_inner().into_new_team();
    let mut created = ok_or_return!(gateway_result(
        insert_records::<Team, _>(gateway.get_ref(), &[new_team]).await
    ));

    match created.pop() {
        Some(team) => {
            tracing::info!("Created team {} ({})", team.name, team.id);
            Ok(HttpResponse::Created().json(ApiResponse::success("Team created", team)))
        }
        None => Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Failed to create team"))),
    }
}

// PATCH /admin/teams/{id}
#[tracing::instrument(name = "Admin update team", skip(gateway, body))]
pub async fn update_team(
    gateway: web::Data<dyn PersistenceGateway>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateTeamRequest>,
) -> Result<HttpResponse> {
    let team_id = path.into_inner();
    if let Err(message) = body.validate() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(message)));
    }

    let patch = body.into_inner().sanitized();
    ok_or_return!(gateway_result(
        update_record(gateway.get_ref(), Entity::Teams, team_id, &patch).await
    ));

    let team = ok_or_return!(require_record(
        find_record::<Team>(gateway.get_ref(), team_id).await,
        "Team not found"
    ));
    Ok(HttpResponse::Ok().json(ApiResponse::success("Team updated", team)))
}

// DELETE /admin/teams/{id}
//
// Players keep existing without a team; a team that still has matches or
// stat lines cannot be deleted.
#[tracing::instrument(name = "Admin delete team", skip(gateway, storage))]
pub async fn delete_team(
    gateway: web::Data<dyn PersistenceGateway>,
    storage: Option<web::Data<MinIOService>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let team_id = path.into_inner();
    let team = ok_or_return!(require_record(
        find_record::<Team>(gateway.get_ref(), team_id).await,
        "Team not found"
    ));

    if let Err(e) = gateway.delete(Entity::Teams, team_id).await {
        return Ok(gateway_error_response(&e));
    }

    if let (Some(storage), Some(key)) = (storage, team.logo_url.as_deref().and_then(object_key_from_url)) {
        if let Err(e) = storage.delete_file(key).await {
            tracing::warn!("Logo {} of deleted team {} left in storage: {}", key, team_id, e);
        }
    }

    Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_message("Team deleted")))
}

// POST /admin/teams/{id}/logo
#[tracing::instrument(
    name = "Admin upload team logo",
    skip(gateway, storage, form),
    fields(file_name = %form.file.file_name.as_deref().unwrap_or("unknown"))
)]
pub async fn upload_logo(
    gateway: web::Data<dyn PersistenceGateway>,
    storage: Option<web::Data<MinIOService>>,
    path: web::Path<Uuid>,
    MultipartForm(form): MultipartForm<LogoUploadForm>,
) -> Result<HttpResponse> {
    let team_id = path.into_inner();
    let Some(storage) = storage else {
        return Ok(HttpResponse::ServiceUnavailable()
            .json(ApiResponse::<()>::error("Logo storage is not configured")));
    };

    let team = ok_or_return!(require_record(
        find_record::<Team>(gateway.get_ref(), team_id).await,
        "Team not found"
    ));

    let extension = get_file_extension(form.file.file_name.as_deref().unwrap_or_default());
    if !ALLOWED_LOGO_EXTENSIONS.contains(&extension.as_str()) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error(
            "Invalid file type. Allowed: png, jpg, jpeg, gif, webp, svg",
        )));
    }
    if form.file.size > MAX_LOGO_SIZE {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::<()>::error("Logo too large. Maximum size is 2MB")));
    }

    let data = match std::fs::read(form.file.file.path()) {
        Ok(data) => Bytes::from(data),
        Err(e) => {
            tracing::error!("Failed to read uploaded logo: {}", e);
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Failed to read upload")));
        }
    };
    let content_type = form
        .file
        .content_type
        .as_ref()
        .map(|mime| mime.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let object_key = match storage.upload_logo(team_id, data, &extension, &content_type).await {
        Ok(key) => key,
        Err(e) => {
            tracing::error!("Failed to store logo for team {}: {}", team_id, e);
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Failed to store logo")));
        }
    };

    let logo_url = media_url(&object_key);
    ok_or_return!(gateway_result(
        update_record(
            gateway.get_ref(),
            Entity::Teams,
            team_id,
            &serde_json::json!({ "logo_url": logo_url }),
        )
        .await
    ));

    if let Some(old_key) = team.logo_url.as_deref().and_then(object_key_from_url) {
        if let Err(e) = storage.delete_file(old_key).await {
            tracing::warn!("Previous logo {} left in storage: {}", old_key, e);
        }
    }

    let team = Team { logo_url: Some(logo_url), ..team };
    Ok(HttpResponse::Ok().json(ApiResponse::success("Logo uploaded", team)))
}

fn get_file_extension(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased_suffix() {
        assert_eq!(get_file_extension("Owls.PNG"), "png");
        assert_eq!(get_file_extension("logo.final.svg"), "svg");
        assert_eq!(get_file_extension("logo"), "");
    }
}
