use reqwest::header::{HeaderMap, HeaderValue};
use std::{sync::Arc, time::Duration, time::Instant};
use tracing::info;
use workbench_schema::{
    ChatOutput, ChatRequest, CompletionOutput, CompletionRequest, ImageOutput, ImageRequest,
    TranscriptionOutput, TranscriptionRequest,
};

use super::credentials::{ProviderAccess, resolve_access};
use super::normalizer::{audio, chat, image};
use super::policy::success_bytes;
use super::{Capability, ProviderKind};
use crate::config::{ProviderDefaults, ProvidersConfig};
use crate::db::{DbActorHandle, DbModelOverride};
use crate::error::WorkbenchError;

pub const WORKBENCH_USER_AGENT: &str = concat!("mcp-workbench/", env!("CARGO_PKG_VERSION"));

/// Shared upstream client: one `reqwest::Client`, provider config, and the DB
/// for stored credentials and model overrides.
#[derive(Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
    config: Arc<ProvidersConfig>,
    db: DbActorHandle,
}

fn build_client(defaults: &ProviderDefaults) -> Result<reqwest::Client, WorkbenchError> {
    let mut headers = HeaderMap::new();
    headers.insert(reqwest::header::ACCEPT, HeaderValue::from_static("application/json"));

    let mut builder = reqwest::Client::builder()
        .user_agent(WORKBENCH_USER_AGENT)
        .redirect(reqwest::redirect::Policy::none())
        .connect_timeout(Duration::from_secs(defaults.connect_timeout_secs))
        .timeout(Duration::from_secs(defaults.request_timeout_secs))
        .default_headers(headers);

    if let Some(proxy_url) = &defaults.proxy {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
    }

    Ok(builder.build()?)
}

/// Fills unset sampling fields from the override; a disabled override rejects the call.
fn apply_override(req: &mut ChatRequest, ov: Option<&DbModelOverride>) -> Result<(), WorkbenchError> {
    let Some(ov) = ov else {
        return Ok(());
    };
    ensure_enabled(Some(ov))?;
    if req.max_tokens.is_none() {
        req.max_tokens = ov.max_tokens.and_then(|v| u32::try_from(v).ok());
    }
    if req.temperature.is_none() {
        #[allow(clippy::cast_possible_truncation)]
        let temperature = ov.temperature.map(|t| t as f32);
        req.temperature = temperature;
    }
    Ok(())
}

fn ensure_enabled(ov: Option<&DbModelOverride>) -> Result<(), WorkbenchError> {
    match ov {
        Some(ov) if !ov.enabled => Err(WorkbenchError::Validation(format!(
            "model disabled: {}/{}",
            ov.provider, ov.model
        ))),
        _ => Ok(()),
    }
}

fn require_model(model: &str) -> Result<(), WorkbenchError> {
    if model.trim().is_empty() {
        return Err(WorkbenchError::Validation("model must not be empty".to_string()));
    }
    Ok(())
}

/// Overrides are stored under the trimmed id, so lookups and upstream calls use it too.
fn trim_model(model: &mut String) {
    let trimmed = model.trim();
    if trimmed.len() != model.len() {
        *model = trimmed.to_string();
    }
}

impl ProviderClient {
    pub fn new(db: DbActorHandle, config: Arc<ProvidersConfig>) -> Result<Self, WorkbenchError> {
        let http = build_client(&config.defaults)?;
        Ok(Self { http, config, db })
    }

    pub fn config(&self) -> &ProvidersConfig {
        &self.config
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Capability check, then override lookup, then credential resolution.
    async fn prepare(
        &self,
        provider: &str,
        model: &str,
        capability: Capability,
    ) -> Result<(ProviderKind, Option<DbModelOverride>, ProviderAccess), WorkbenchError> {
        let kind: ProviderKind = provider.parse()?;
        require_model(model)?;
        if !kind.supports(capability) {
            return Err(WorkbenchError::UnsupportedCapability {
                provider: kind.name().to_string(),
                capability: capability.as_str(),
            });
        }

        let ov = self.db.get_model_override(kind, model).await?;
        ensure_enabled(ov.as_ref())?;

        let stored = self.db.get_provider_config(kind).await?;
        let access = resolve_access(kind, stored.as_ref(), &self.config, |name| {
            std::env::var(name).ok()
        })?;
        Ok((kind, ov, access))
    }

    async fn send(
        &self,
        kind: ProviderKind,
        request: reqwest::Request,
    ) -> Result<axum::body::Bytes, WorkbenchError> {
        let resp = self.http.execute(request).await?;
        success_bytes(kind, resp).await
    }

    pub async fn chat(&self, mut req: ChatRequest) -> Result<ChatOutput, WorkbenchError> {
        trim_model(&mut req.model);
        let (kind, ov, access) = self.prepare(&req.provider, &req.model, Capability::Chat).await?;
        apply_override(&mut req, ov.as_ref())?;

        let url = kind.endpoint(Capability::Chat, &access.base_url, &req.model)?;
        let request = chat::build_chat_request(&self.http, kind, &url, access.api_key.as_deref(), &req)?;

        let start = Instant::now();
        let body = self.send(kind, request).await?;
        let parsed = chat::parse_chat_response(kind, &body)?;
        info!(
            provider = %kind,
            model = %req.model,
            latency_ms = start.elapsed().as_millis() as u64,
            finish_reason = ?parsed.finish_reason,
            "chat completed"
        );

        Ok(ChatOutput {
            text: parsed.text,
            provider: kind.name().to_string(),
            model: req.model,
            finish_reason: parsed.finish_reason,
        })
    }

    /// Single prompt sent as one user turn through the chat endpoint.
    pub async fn complete(&self, req: CompletionRequest) -> Result<CompletionOutput, WorkbenchError> {
        Ok(self.chat(req.into()).await?.into())
    }

    pub async fn generate_images(
        &self,
        mut req: ImageRequest,
    ) -> Result<ImageOutput, WorkbenchError> {
        trim_model(&mut req.model);
        let (kind, _, access) = self
            .prepare(&req.provider, &req.model, Capability::ImageGeneration)
            .await?;
        let url = kind.endpoint(Capability::ImageGeneration, &access.base_url, &req.model)?;
        let request =
            image::build_image_request(&self.http, kind, &url, access.api_key.as_deref(), &req)?;

        let body = self.send(kind, request).await?;
        let out = image::parse_image_response(&body)?;
        info!(provider = %kind, model = %req.model, images = out.images.len(), "images generated");
        Ok(out)
    }

    pub async fn transcribe(
        &self,
        mut req: TranscriptionRequest,
    ) -> Result<TranscriptionOutput, WorkbenchError> {
        trim_model(&mut req.model);
        let (kind, _, access) = self
            .prepare(&req.provider, &req.model, Capability::AudioTranscription)
            .await?;
        let url = kind.endpoint(Capability::AudioTranscription, &access.base_url, &req.model)?;
        let request = audio::build_transcription_request(
            &self.http,
            kind,
            &url,
            access.api_key.as_deref(),
            &req,
        )?;

        let body = self.send(kind, request).await?;
        let out = audio::parse_transcription_response(&body)?;
        info!(provider = %kind, model = %req.model, chars = out.text.len(), "audio transcribed");
        Ok(out)
    }
}
