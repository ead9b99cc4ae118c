use crate::error::WorkbenchError;
use crate::utils::logging::with_pretty_json_debug;
use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;
use workbench_schema::{
    ChatRequest, CompletionRequest, ImageRequest, TranscriptionRequest,
};

/// Semantic checks that serde cannot express.
pub trait Validate {
    fn validate(&self) -> Result<(), WorkbenchError>;
}

/// `Json<T>` that also runs [`Validate`] before the handler sees the body.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Serialize + Validate,
{
    type Rejection = WorkbenchError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let path = req.uri().path().to_string();
        let Json(body) = Json::<T>::from_request(req, state).await?;
        body.validate()?;

        with_pretty_json_debug(&body, |pretty_body| {
            debug!(path = %path, body = %pretty_body, "Validated request body");
        });
        Ok(Self(body))
    }
}

/// `Path<T>` whose rejection uses the JSON error envelope.
pub struct ValidPath<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = WorkbenchError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

pub(crate) fn require_temperature(temperature: Option<f32>) -> Result<(), WorkbenchError> {
    if let Some(t) = temperature
        && !(0.0..=2.0).contains(&t)
    {
        return Err(WorkbenchError::Validation(
            "temperature must be between 0 and 2".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn require_non_blank(field: &str, value: &str) -> Result<(), WorkbenchError> {
    if value.trim().is_empty() {
        return Err(WorkbenchError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn require_known_provider(provider: &str) -> Result<(), WorkbenchError> {
    require_non_blank("provider", provider)?;
    provider.parse::<crate::providers::ProviderKind>().map(|_| ())
}

impl Validate for ChatRequest {
    fn validate(&self) -> Result<(), WorkbenchError> {
        require_known_provider(&self.provider)?;
        require_non_blank("model", &self.model)?;
        if self.conversation().is_empty() {
            return Err(WorkbenchError::Validation(
                "messages or prompt must carry content".to_string(),
            ));
        }
        require_temperature(self.temperature)
    }
}

impl Validate for CompletionRequest {
    fn validate(&self) -> Result<(), WorkbenchError> {
        require_known_provider(&self.provider)?;
        require_non_blank("model", &self.model)?;
        require_non_blank("prompt", &self.prompt)
    }
}

impl Validate for ImageRequest {
    fn validate(&self) -> Result<(), WorkbenchError> {
        require_known_provider(&self.provider)?;
        require_non_blank("model", &self.model)?;
        require_non_blank("prompt", &self.prompt)?;
        if self.n == Some(0) {
            return Err(WorkbenchError::Validation("n must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Validate for TranscriptionRequest {
    fn validate(&self) -> Result<(), WorkbenchError> {
        require_known_provider(&self.provider)?;
        require_non_blank("model", &self.model)?;
        require_non_blank("audio_base64", &self.audio_base64)
    }
}
