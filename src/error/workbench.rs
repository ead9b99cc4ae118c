use axum::{
    Json,
    extract::rejection::{BytesRejection, JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum WorkbenchError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),

    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Provider {provider} does not support {capability}")]
    UnsupportedCapability {
        provider: String,
        capability: &'static str,
    },

    #[error("Provider {0} is disabled")]
    ProviderDisabled(String),

    #[error("Missing API key for provider {0}")]
    MissingApiKey(String),

    #[error("Feature disabled: {0}")]
    FeatureDisabled(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upstream answered with a non-2xx status; `message` is the upstream error text.
    #[error("Upstream error with status {status}: {message:.200}")]
    Upstream { status: StatusCode, message: String },

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    #[error("Unexpected error: {0}")]
    UnexpectedError(String),
}

impl From<sqlx::Error> for WorkbenchError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(err, sqlx::Error::RowNotFound) {
            return WorkbenchError::NotFound("record not found".to_string());
        }
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return WorkbenchError::Conflict(db_err.message().to_string());
            }
            if db_err.is_foreign_key_violation() {
                return WorkbenchError::NotFound("referenced record not found".to_string());
            }
        }
        WorkbenchError::DatabaseError(err)
    }
}

impl From<BytesRejection> for WorkbenchError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return WorkbenchError::PayloadTooLarge(rejection.body_text());
        }
        WorkbenchError::UnexpectedError(format!("Failed to read request body: {rejection}"))
    }
}

impl From<JsonRejection> for WorkbenchError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::BytesRejection(e) => e.into(),
            JsonRejection::JsonSyntaxError(e) => WorkbenchError::InvalidJson(e.body_text()),
            other => WorkbenchError::Validation(other.body_text()),
        }
    }
}

impl From<PathRejection> for WorkbenchError {
    fn from(rejection: PathRejection) -> Self {
        WorkbenchError::Validation(rejection.body_text())
    }
}

impl WorkbenchError {
    pub fn status(&self) -> StatusCode {
        match self {
            WorkbenchError::Validation(_)
            | WorkbenchError::InvalidJson(_)
            | WorkbenchError::UnsupportedProvider(_)
            | WorkbenchError::UnsupportedCapability { .. }
            | WorkbenchError::ProviderDisabled(_) => StatusCode::BAD_REQUEST,
            WorkbenchError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            WorkbenchError::MissingApiKey(_) => StatusCode::UNAUTHORIZED,
            WorkbenchError::FeatureDisabled(_) => StatusCode::FORBIDDEN,
            WorkbenchError::NotFound(_) => StatusCode::NOT_FOUND,
            WorkbenchError::Conflict(_) => StatusCode::CONFLICT,
            WorkbenchError::Upstream { status, .. } => *status,
            WorkbenchError::ReqwestError(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            WorkbenchError::ReqwestError(_) | WorkbenchError::JsonError(_) => {
                StatusCode::BAD_GATEWAY
            }
            WorkbenchError::IoError(_)
            | WorkbenchError::UrlError(_)
            | WorkbenchError::RactorError(_)
            | WorkbenchError::DatabaseError(_)
            | WorkbenchError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WorkbenchError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_body = match self {
            WorkbenchError::Validation(message) => ApiErrorObject::new("INVALID_REQUEST", message),
            WorkbenchError::InvalidJson(message) => ApiErrorObject::new("INVALID_JSON", message),
            WorkbenchError::PayloadTooLarge(message) => {
                ApiErrorObject::new("PAYLOAD_TOO_LARGE", message)
            }
            WorkbenchError::UnsupportedProvider(name) => {
                ApiErrorObject::new("UNSUPPORTED_PROVIDER", "unsupported provider")
                    .with_details(serde_json::json!({ "provider": name }))
            }
            WorkbenchError::UnsupportedCapability {
                provider,
                capability,
            } => ApiErrorObject::new(
                "UNSUPPORTED_CAPABILITY",
                format!("provider {provider} does not support {capability}"),
            ),
            WorkbenchError::ProviderDisabled(provider) => ApiErrorObject::new(
                "PROVIDER_DISABLED",
                format!("provider {provider} is disabled"),
            ),
            WorkbenchError::MissingApiKey(provider) => ApiErrorObject::new(
                "MISSING_API_KEY",
                format!("no API key configured for provider {provider}"),
            ),
            WorkbenchError::FeatureDisabled(feature) => ApiErrorObject::new(
                "FEATURE_DISABLED",
                format!("{feature} is disabled on this server"),
            ),
            WorkbenchError::NotFound(what) => ApiErrorObject::new("NOT_FOUND", what),
            WorkbenchError::Conflict(detail) => {
                tracing::debug!(detail = %detail, "Unique constraint violated");
                ApiErrorObject::new("CONFLICT", "A record with the same key already exists.")
            }
            WorkbenchError::Upstream { status, message } => {
                tracing::warn!(status = %status, message = %message, "Upstream error passed through");
                ApiErrorObject::new("UPSTREAM_ERROR", message)
            }
            WorkbenchError::ReqwestError(e) if e.is_timeout() => {
                tracing::warn!(error = %e, "Upstream timeout");
                ApiErrorObject::new("UPSTREAM_TIMEOUT", "Upstream service timed out.")
            }
            WorkbenchError::ReqwestError(e) => {
                tracing::warn!(error = %e, status = ?e.status(), "Upstream reqwest error");
                ApiErrorObject::new("UPSTREAM_ERROR", "Upstream service error.")
            }
            WorkbenchError::JsonError(e) => {
                tracing::warn!(error = %e, "Failed to parse upstream payload");
                ApiErrorObject::new("BAD_UPSTREAM_PAYLOAD", "Failed to parse upstream response.")
            }
            other @ (WorkbenchError::IoError(_)
            | WorkbenchError::UrlError(_)
            | WorkbenchError::RactorError(_)
            | WorkbenchError::DatabaseError(_)
            | WorkbenchError::UnexpectedError(_)) => {
                tracing::error!(error = %other, "Internal error");
                ApiErrorObject::new("INTERNAL_ERROR", "An internal server error occurred.")
            }
        };
        (status, Json(ApiErrorBody { inner: error_body })).into_response()
    }
}

/// Standardized API error response payload.
#[derive(Debug, Serialize)]
pub struct ApiErrorObject {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiErrorObject {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    #[serde(rename = "error")]
    pub inner: ApiErrorObject,
}
