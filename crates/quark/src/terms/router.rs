use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Season, Term, TermError, TermKey};
use super::repository::{TermRepository, TermView};
use super::service::{TermListing, TermService, TermServiceError};
use crate::events::EventPublisher;
use crate::repository::RepositoryError;

/// Body accepted by `POST /api/v1/terms`.
#[derive(Debug, Clone, Deserialize)]
pub struct TermPayload {
    pub term: String,
    pub year: u16,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub key: Option<TermKey>,
}

impl TryFrom<TermPayload> for Term {
    type Error = TermError;

    fn try_from(payload: TermPayload) -> Result<Self, Self::Error> {
        Ok(Term {
            season: Season::from_code(&payload.term)?,
            year: payload.year,
            current: payload.current,
            key: payload.key,
        })
    }
}

/// Router builder exposing term lookups and administrative saves.
pub fn term_router<R, P>(service: Arc<TermService<R, P>>) -> Router
where
    R: TermRepository + 'static,
    P: EventPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/terms",
            get(list_handler::<R, P>).post(save_handler::<R, P>),
        )
        .route("/api/v1/terms/current", get(current_handler::<R, P>))
        .route("/api/v1/terms/:url_name", get(detail_handler::<R, P>))
        .with_state(service)
}

pub(crate) async fn list_handler<R, P>(
    State(service): State<Arc<TermService<R, P>>>,
    Query(listing): Query<TermListing>,
) -> Result<Json<Vec<TermView>>, TermServiceError>
where
    R: TermRepository + 'static,
    P: EventPublisher + 'static,
{
    let terms = service.list_terms(listing)?;
    Ok(Json(terms.iter().map(TermView::from).collect()))
}

pub(crate) async fn save_handler<R, P>(
    State(service): State<Arc<TermService<R, P>>>,
    Json(payload): Json<TermPayload>,
) -> Result<Json<TermView>, TermServiceError>
where
    R: TermRepository + 'static,
    P: EventPublisher + 'static,
{
    let term = Term::try_from(payload)?;
    let saved = service.save(term)?;
    Ok(Json(TermView::from(&saved)))
}

pub(crate) async fn current_handler<R, P>(
    State(service): State<Arc<TermService<R, P>>>,
) -> Result<Json<TermView>, TermServiceError>
where
    R: TermRepository + 'static,
    P: EventPublisher + 'static,
{
    let current = service.current_term()?.ok_or(RepositoryError::NotFound)?;
    Ok(Json(TermView::from(&current)))
}

pub(crate) async fn detail_handler<R, P>(
    State(service): State<Arc<TermService<R, P>>>,
    Path(url_name): Path<String>,
) -> Result<Json<TermView>, TermServiceError>
where
    R: TermRepository + 'static,
    P: EventPublisher + 'static,
{
    let term = service.by_url_name(&url_name)?;
    Ok(Json(TermView::from(&term)))
}

impl IntoResponse for TermServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            TermServiceError::Term(TermError::InvalidSeason(_) | TermError::InvalidYear) => {
                StatusCode::BAD_REQUEST
            }
            TermServiceError::Term(TermError::InvariantViolation { .. })
            | TermServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            TermServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            TermServiceError::Repository(RepositoryError::Unavailable(_))
            | TermServiceError::Event(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
