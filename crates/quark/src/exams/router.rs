use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{CourseOfferingId, Exam, ExamDraft, ExamFlag, ExamId, FlagId, UserId};
use super::repository::{ExamRepository, ExamStatusView};
use super::service::{ExamService, ExamServiceError};
use crate::events::EventPublisher;
use crate::repository::RepositoryError;

#[derive(Debug, Clone, Deserialize)]
pub struct FlagRequest {
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct VerifyRequest {
    pub verified: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PermissionRequest {
    pub allowed: bool,
}

/// Router builder exposing the exam archive endpoints.
pub fn exam_router<R, P>(service: Arc<ExamService<R, P>>) -> Router
where
    R: ExamRepository + 'static,
    P: EventPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/offerings/:offering/exams",
            get(list_visible_handler::<R, P>),
        )
        .route("/api/v1/exams", post(upload_handler::<R, P>))
        .route(
            "/api/v1/exams/:exam_id",
            get(status_handler::<R, P>).delete(delete_handler::<R, P>),
        )
        .route("/api/v1/exams/:exam_id/flags", post(flag_handler::<R, P>))
        .route(
            "/api/v1/exams/:exam_id/verify",
            post(verify_handler::<R, P>),
        )
        .route(
            "/api/v1/exams/:exam_id/permissions/:user",
            put(set_permission_handler::<R, P>).delete(clear_permission_handler::<R, P>),
        )
        .route(
            "/api/v1/flags/:flag_id/resolve",
            post(resolve_flag_handler::<R, P>),
        )
        .with_state(service)
}

pub(crate) async fn list_visible_handler<R, P>(
    State(service): State<Arc<ExamService<R, P>>>,
    Path(offering): Path<String>,
) -> Result<Json<Vec<Exam>>, ExamServiceError>
where
    R: ExamRepository + 'static,
    P: EventPublisher + 'static,
{
    let exams = service.list_visible_exams(&CourseOfferingId(offering))?;
    Ok(Json(exams))
}

pub(crate) async fn upload_handler<R, P>(
    State(service): State<Arc<ExamService<R, P>>>,
    Json(draft): Json<ExamDraft>,
) -> Result<(StatusCode, Json<ExamStatusView>), ExamServiceError>
where
    R: ExamRepository + 'static,
    P: EventPublisher + 'static,
{
    let exam = service.upload(draft)?;
    let status = service.status(exam.id)?;
    Ok((StatusCode::CREATED, Json(status)))
}

pub(crate) async fn status_handler<R, P>(
    State(service): State<Arc<ExamService<R, P>>>,
    Path(exam_id): Path<u64>,
) -> Result<Json<ExamStatusView>, ExamServiceError>
where
    R: ExamRepository + 'static,
    P: EventPublisher + 'static,
{
    Ok(Json(service.status(ExamId(exam_id))?))
}

pub(crate) async fn delete_handler<R, P>(
    State(service): State<Arc<ExamService<R, P>>>,
    Path(exam_id): Path<u64>,
) -> Result<StatusCode, ExamServiceError>
where
    R: ExamRepository + 'static,
    P: EventPublisher + 'static,
{
    service.delete(ExamId(exam_id))?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn flag_handler<R, P>(
    State(service): State<Arc<ExamService<R, P>>>,
    Path(exam_id): Path<u64>,
    Json(request): Json<FlagRequest>,
) -> Result<(StatusCode, Json<ExamFlag>), ExamServiceError>
where
    R: ExamRepository + 'static,
    P: EventPublisher + 'static,
{
    let flag = service.flag(ExamId(exam_id), request.reason)?;
    Ok((StatusCode::CREATED, Json(flag)))
}

pub(crate) async fn resolve_flag_handler<R, P>(
    State(service): State<Arc<ExamService<R, P>>>,
    Path(flag_id): Path<u64>,
) -> Result<Json<ExamFlag>, ExamServiceError>
where
    R: ExamRepository + 'static,
    P: EventPublisher + 'static,
{
    Ok(Json(service.resolve_flag(FlagId(flag_id))?))
}

pub(crate) async fn verify_handler<R, P>(
    State(service): State<Arc<ExamService<R, P>>>,
    Path(exam_id): Path<u64>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<ExamStatusView>, ExamServiceError>
where
    R: ExamRepository + 'static,
    P: EventPublisher + 'static,
{
    Ok(Json(service.verify(ExamId(exam_id), request.verified)?))
}

pub(crate) async fn set_permission_handler<R, P>(
    State(service): State<Arc<ExamService<R, P>>>,
    Path((exam_id, user)): Path<(u64, String)>,
    Json(request): Json<PermissionRequest>,
) -> Result<Json<ExamStatusView>, ExamServiceError>
where
    R: ExamRepository + 'static,
    P: EventPublisher + 'static,
{
    let status = service.set_permission(ExamId(exam_id), UserId(user), request.allowed)?;
    Ok(Json(status))
}

pub(crate) async fn clear_permission_handler<R, P>(
    State(service): State<Arc<ExamService<R, P>>>,
    Path((exam_id, user)): Path<(u64, String)>,
) -> Result<Json<ExamStatusView>, ExamServiceError>
where
    R: ExamRepository + 'static,
    P: EventPublisher + 'static,
{
    Ok(Json(service.clear_permission(ExamId(exam_id), &UserId(user))?))
}

impl IntoResponse for ExamServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ExamServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            ExamServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            ExamServiceError::Repository(RepositoryError::Unavailable(_))
            | ExamServiceError::Event(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
