use actix_web::{web, HttpResponse, Result};
use serde::Serialize;
use uuid::Uuid;

use crate::db::helpers::gateway_error_response;
use crate::models::common::ApiResponse;
use crate::models::matches::ScheduleMatchesRequest;
use crate::reconcile::{MatchDraft, SessionError, SubmissionOutcome};
use crate::services::{EditorError, MatchEditorService};

#[derive(Serialize)]
pub struct SubmitDraftResponse {
    pub outcome: SubmissionOutcome,
    /// Freshly loaded draft reflecting what was stored
    pub draft: MatchDraft,
}

fn editor_error_response(error: &EditorError) -> HttpResponse {
    match error {
        EditorError::MatchNotFound(_) => {
            HttpResponse::NotFound().json(ApiResponse::<()>::error("Match not found"))
        }
        EditorError::MapNotFound(_) => {
            HttpResponse::NotFound().json(ApiResponse::<()>::error("Map not found"))
        }
        EditorError::TeamNotFound(_) | EditorError::DraftMismatch { .. } | EditorError::Validation(_) => {
            HttpResponse::BadRequest().json(ApiResponse::<()>::error(error.to_string()))
        }
        EditorError::SubmissionInFlight(_) | EditorError::Session(SessionError::Busy) => {
            HttpResponse::Conflict().json(ApiResponse::<()>::error("Match is already being saved"))
        }
        EditorError::Session(SessionError::Persistence(e)) => {
            tracing::error!("Match submission aborted: {}", e);
            HttpResponse::InternalServerError().json(ApiResponse::<()>::error("Failed to save match"))
        }
        EditorError::Session(session) => {
            HttpResponse::BadRequest().json(ApiResponse::<()>::error(session.to_string()))
        }
        EditorError::Gateway(e) => gateway_error_response(e),
    }
}

// POST /admin/matches/schedule
#[tracing::instrument(name = "Admin schedule matches", skip(editor, body))]
pub async fn schedule_matches(
    editor: web::Data<MatchEditorService>,
    body: web::Json<ScheduleMatchesRequest>,
) -> Result<HttpResponse> {
    match editor.schedule(body.into_inner()).await {
        Ok(scheduled) => Ok(HttpResponse::Created().json(ApiResponse::success(
            format!("Scheduled {} matches", scheduled.len()),
            scheduled,
        ))),
        Err(e) => Ok(editor_error_response(&e)),
    }
}

// DELETE /admin/matches/{id}
#[tracing::instrument(name = "Admin delete match", skip(editor))]
pub async fn delete_match(
    editor: web::Data<MatchEditorService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match editor.delete_match(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::<()>::success_message("Match deleted"))),
        Err(e) => Ok(editor_error_response(&e)),
    }
}

// GET /admin/matches/{id}/draft
#[tracing::instrument(name = "Admin load match draft", skip(editor))]
pub async fn get_draft(
    editor: web::Data<MatchEditorService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    match editor.load_draft(path.into_inner()).await {
        Ok(draft) => Ok(HttpResponse::Ok().json(ApiResponse::success("Draft loaded", draft))),
        Err(e) => Ok(editor_error_response(&e)),
    }
}

// PUT /admin/matches/{id}/draft
#[tracing::instrument(name = "Admin submit match draft", skip(editor, body))]
pub async fn submit_draft(
    editor: web::Data<MatchEditorService>,
    path: web::Path<Uuid>,
    body: web::Json<MatchDraft>,
) -> Result<HttpResponse> {
    let match_id = path.into_inner();
    let outcome = match editor.submit(match_id, body.into_inner()).await {
        Ok(outcome) => outcome,
        Err(e) => return Ok(editor_error_response(&e)),
    };

    match editor.load_draft(match_id).await {
        Ok(draft) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            "Match saved",
            SubmitDraftResponse { outcome, draft },
        ))),
        Err(e) => Ok(editor_error_response(&e)),
    }
}

// POST /admin/matches/{id}/draft/preview
#[tracing::instrument(name = "Admin preview match draft", skip(editor, body))]
pub async fn preview_draft(
    editor: web::Data<MatchEditorService>,
    path: web::Path<Uuid>,
    body: web::Json<MatchDraft>,
) -> Result<HttpResponse> {
    match editor.preview(path.into_inner(), body.into_inner()).await {
        Ok(plan) => Ok(HttpResponse::Ok().json(ApiResponse::success("Draft preview", plan))),
        Err(e) => Ok(editor_error_response(&e)),
    }
}

// DELETE /admin/matches/{id}/maps/{map_id}
#[tracing::instrument(name = "Admin delete match map", skip(editor))]
pub async fn delete_map(
    editor: web::Data<MatchEditorService>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (match_id, map_id) = path.into_inner();
    match editor.delete_map(match_id, map_id).await {
        Ok(remaining) => Ok(HttpResponse::Ok().json(ApiResponse::success("Map deleted", remaining))),
        Err(e) => Ok(editor_error_response(&e)),
    }
}
