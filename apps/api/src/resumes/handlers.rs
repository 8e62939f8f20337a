use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{ResumeRecord, ResumeSummary, StatusView};
use crate::owner::OwnerId;
use crate::resumes::orchestrator::Upload;
use crate::state::AppState;

/// Multipart field carrying the document.
pub const UPLOAD_FIELD: &str = "resume";

#[derive(Serialize)]
pub struct ResumeResponse {
    pub resume: ResumeRecord,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub resume: ResumeRecord,
}

#[derive(Serialize)]
pub struct ResumeListResponse {
    pub resumes: Vec<ResumeSummary>,
}

#[derive(Serialize)]
pub struct ReprocessResponse {
    pub message: String,
    pub resume: StatusView,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /api/v1/resumes/upload
pub async fn handle_upload(
    State(state): State<AppState>,
    OwnerId(user_id): OwnerId,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let max_bytes = state.config.max_file_size;
    let multipart_error = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::FileTooLarge { max_bytes }
        } else {
            AppError::Validation(format!("Malformed upload: {}", e.body_text()))
        }
    };

    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or("resume").to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some(Upload {
            file_name,
            mime_type,
            bytes,
        });
        break;
    }

    let upload = upload.ok_or(AppError::NoFile)?;
    let scheduled = state.resumes.submit(user_id, upload).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "Resume uploaded successfully. Processing...".to_string(),
            resume: scheduled.record,
        }),
    ))
}

/// GET /api/v1/resumes
pub async fn handle_list(
    State(state): State<AppState>,
    OwnerId(user_id): OwnerId,
) -> Result<Json<ResumeListResponse>, AppError> {
    let resumes = state.resumes.list(user_id).await?;
    Ok(Json(ResumeListResponse { resumes }))
}

/// GET /api/v1/resumes/active
pub async fn handle_get_active(
    State(state): State<AppState>,
    OwnerId(user_id): OwnerId,
) -> Result<Json<ResumeResponse>, AppError> {
    let resume = state.resumes.get_active(user_id).await?;
    Ok(Json(ResumeResponse { resume }))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    OwnerId(user_id): OwnerId,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeResponse>, AppError> {
    let resume = state.resumes.get(id, user_id).await?;
    Ok(Json(ResumeResponse { resume }))
}

/// GET /api/v1/resumes/:id/status
pub async fn handle_get_status(
    State(state): State<AppState>,
    OwnerId(user_id): OwnerId,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusView>, AppError> {
    Ok(Json(state.resumes.get_status(id, user_id).await?))
}

/// POST /api/v1/resumes/:id/reprocess
pub async fn handle_reprocess(
    State(state): State<AppState>,
    OwnerId(user_id): OwnerId,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<ReprocessResponse>), AppError> {
    let scheduled = state.resumes.reprocess(id, user_id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ReprocessResponse {
            message: "Resume reprocessing started".to_string(),
            resume: StatusView::from(&scheduled.record),
        }),
    ))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    OwnerId(user_id): OwnerId,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    state.resumes.delete(id, user_id).await?;
    Ok(Json(MessageResponse {
        message: "Resume deleted successfully".to_string(),
    }))
}
