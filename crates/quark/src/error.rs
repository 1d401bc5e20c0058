use crate::config::ConfigError;
use crate::exams::ExamServiceError;
use crate::telemetry::TelemetryError;
use crate::terms::{TermImportError, TermServiceError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Import(TermImportError),
    Terms(TermServiceError),
    Exams(ExamServiceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Import(err) => write!(f, "term import error: {}", err),
            AppError::Terms(err) => write!(f, "term error: {}", err),
            AppError::Exams(err) => write!(f, "exam error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Import(err) => Some(err),
            AppError::Terms(err) => Some(err),
            AppError::Exams(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Terms(err) => err.into_response(),
            AppError::Exams(err) => err.into_response(),
            AppError::Import(_) => {
                let body = Json(json!({ "error": self.to_string() }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_) => {
                let body = Json(json!({ "error": self.to_string() }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<TermImportError> for AppError {
    fn from(value: TermImportError) -> Self {
        Self::Import(value)
    }
}

impl From<TermServiceError> for AppError {
    fn from(value: TermServiceError) -> Self {
        Self::Terms(value)
    }
}

impl From<ExamServiceError> for AppError {
    fn from(value: ExamServiceError) -> Self {
        Self::Exams(value)
    }
}
