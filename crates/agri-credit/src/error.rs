use crate::config::ConfigError;
use crate::credit::{CreditServiceError, ImportError, RegistryError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

/// Failures surfaced by the service binary and the HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Import(ImportError),
    Registry(RegistryError),
    Evaluation(CreditServiceError),
    Usage(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "invalid configuration: {err}"),
            AppError::Telemetry(err) => write!(f, "logging setup failed: {err}"),
            AppError::Io(err) => write!(f, "I/O failure: {err}"),
            AppError::Server(err) => write!(f, "HTTP server failed: {err}"),
            AppError::Import(err) => write!(f, "profile import failed: {err}"),
            AppError::Registry(err) => write!(f, "rule-set error: {err}"),
            AppError::Evaluation(err) => write!(f, "evaluation error: {err}"),
            AppError::Usage(message) => write!(f, "usage error: {message}"),
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
            AppError::Registry(err) => Some(err),
            AppError::Evaluation(err) => Some(err),
            AppError::Usage(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Import(_) | AppError::Registry(_) | AppError::Usage(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Evaluation(CreditServiceError::MissingData(_)) => StatusCode::NOT_FOUND,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Evaluation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

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

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<ImportError> for AppError {
    fn from(value: ImportError) -> Self {
        Self::Import(value)
    }
}

impl From<RegistryError> for AppError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

impl From<CreditServiceError> for AppError {
    fn from(value: CreditServiceError) -> Self {
        Self::Evaluation(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credit::FarmerId;

    #[test]
    fn missing_data_maps_to_not_found() {
        let error = AppError::from(CreditServiceError::MissingData(FarmerId::from("F-9")));
        assert_eq!(error.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unknown_rule_set_maps_to_bad_request() {
        let error = AppError::from(RegistryError::UnknownVersion("9.9".to_string()));
        assert_eq!(
            error.to_string(),
            "rule-set error: unknown rule-set version '9.9'"
        );
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
