use crate::auth::AccessDenied;
use crate::config::ConfigError;
use crate::reviews::{ImportError, NarrativeError, ReviewServiceError, StoreError};
use crate::telemetry::TelemetryError;
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
    Import(ImportError),
    Review(ReviewServiceError),
    Narrative(NarrativeError),
    Access(AccessDenied),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Review(ReviewServiceError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Review(ReviewServiceError::SubjectNotFound(_))
            | AppError::Review(ReviewServiceError::Store(StoreError::NotFound))
            | AppError::Narrative(_) => StatusCode::NOT_FOUND,
            AppError::Review(ReviewServiceError::Store(StoreError::Conflict)) => {
                StatusCode::CONFLICT
            }
            AppError::Review(ReviewServiceError::NothingToImport) | AppError::Import(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Access(_) => StatusCode::UNAUTHORIZED,
            AppError::Review(ReviewServiceError::Store(StoreError::Unavailable(_)))
            | AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Import(err) => write!(f, "import failed: {}", err),
            AppError::Review(err) => write!(f, "{}", err),
            AppError::Narrative(err) => write!(f, "{}", err),
            AppError::Access(err) => write!(f, "access denied: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Import(err) => Some(err),
            AppError::Review(err) => Some(err),
            AppError::Narrative(err) => Some(err),
            AppError::Access(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
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

impl From<ImportError> for AppError {
    fn from(value: ImportError) -> Self {
        Self::Import(value)
    }
}

impl From<ReviewServiceError> for AppError {
    fn from(value: ReviewServiceError) -> Self {
        Self::Review(value)
    }
}

impl From<NarrativeError> for AppError {
    fn from(value: NarrativeError) -> Self {
        Self::Narrative(value)
    }
}

impl From<AccessDenied> for AppError {
    fn from(value: AccessDenied) -> Self {
        Self::Access(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_errors_map_to_http_statuses() {
        let cases = [
            (
                AppError::from(ReviewServiceError::Validation("blank".to_string())),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                AppError::from(ReviewServiceError::SubjectNotFound("Kim".to_string())),
                StatusCode::NOT_FOUND,
            ),
            (
                AppError::from(ReviewServiceError::Store(StoreError::Conflict)),
                StatusCode::CONFLICT,
            ),
            (
                AppError::from(ReviewServiceError::NothingToImport),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(ImportError::MissingNameColumn),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::from(ReviewServiceError::Store(StoreError::Unavailable(
                    "offline".to_string(),
                ))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::from(AccessDenied::WrongPassword),
                StatusCode::UNAUTHORIZED,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status(), expected, "{error}");
        }
    }
}
