//! Static table of supported upstream vendors.
//!
//! One row per provider: default base URL, capability paths, auth template,
//! wire dialect and the env var consulted for an API key.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, sync::LazyLock};

use url::Url;

use super::provider_endpoints::build_provider_url;
use crate::error::WorkbenchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Gemini,
    Ollama,
    Groq,
    Mistral,
    DeepSeek,
    OpenRouter,
    Together,
    Xai,
    Cohere,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Chat,
    ImageGeneration,
    AudioTranscription,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Chat => "chat",
            Capability::ImageGeneration => "image_generation",
            Capability::AudioTranscription => "audio_transcription",
        }
    }
}

/// How the API key travels on the outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `<header>: <key>`
    Header(&'static str),
    /// No key (local runtimes).
    None,
}

/// Wire format family of the chat endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    OpenAi,
    Anthropic,
    Gemini,
    Ollama,
    Cohere,
}

#[derive(Debug)]
pub struct ProviderSpec {
    pub kind: ProviderKind,
    pub name: &'static str,
    pub display_name: &'static str,
    pub base_url: &'static str,
    /// May contain `{model}`.
    pub chat_path: &'static str,
    pub image_path: Option<&'static str>,
    pub audio_path: Option<&'static str>,
    pub auth: AuthScheme,
    /// Static headers sent with every call.
    pub extra_headers: &'static [(&'static str, &'static str)],
    pub dialect: Dialect,
    pub streaming: bool,
    pub env_key: Option<&'static str>,
    pub default_models: &'static [&'static str],
}

const ANTHROPIC_VERSION: &str = "2023-06-01";

static SPECS: [ProviderSpec; 11] = [
    ProviderSpec {
        kind: ProviderKind::OpenAi,
        name: "openai",
        display_name: "OpenAI",
        base_url: "https://api.openai.com",
        chat_path: "/v1/chat/completions",
        image_path: Some("/v1/images/generations"),
        audio_path: Some("/v1/audio/transcriptions"),
        auth: AuthScheme::Bearer,
        extra_headers: &[],
        dialect: Dialect::OpenAi,
        streaming: true,
        env_key: Some("OPENAI_API_KEY"),
        default_models: &["gpt-4o", "gpt-4o-mini", "dall-e-3", "whisper-1"],
    },
    ProviderSpec {
        kind: ProviderKind::Anthropic,
        name: "anthropic",
        display_name: "Anthropic",
        base_url: "https://api.anthropic.com",
        chat_path: "/v1/messages",
        image_path: None,
        audio_path: None,
        auth: AuthScheme::Header("x-api-key"),
        extra_headers: &[("anthropic-version", ANTHROPIC_VERSION)],
        dialect: Dialect::Anthropic,
        streaming: true,
        env_key: Some("ANTHROPIC_API_KEY"),
        default_models: &["claude-3-5-sonnet-latest", "claude-3-5-haiku-latest"],
    },
    ProviderSpec {
        kind: ProviderKind::Gemini,
        name: "gemini",
        display_name: "Google Gemini",
        base_url: "https://generativelanguage.googleapis.com",
        chat_path: "/v1beta/models/{model}:generateContent",
        image_path: None,
        audio_path: None,
        auth: AuthScheme::Header("x-goog-api-key"),
        extra_headers: &[],
        dialect: Dialect::Gemini,
        streaming: true,
        env_key: Some("GEMINI_API_KEY"),
        default_models: &["gemini-1.5-pro", "gemini-1.5-flash", "gemini-2.0-flash"],
    },
    ProviderSpec {
        kind: ProviderKind::Ollama,
        name: "ollama",
        display_name: "Ollama",
        base_url: "http://localhost:11434",
        chat_path: "/api/chat",
        image_path: None,
        audio_path: None,
        auth: AuthScheme::None,
        extra_headers: &[],
        dialect: Dialect::Ollama,
        streaming: true,
        env_key: None,
        default_models: &["llama3.1", "mistral", "qwen2.5"],
    },
    ProviderSpec {
        kind: ProviderKind::Groq,
        name: "groq",
        display_name: "Groq",
        base_url: "https://api.groq.com",
        chat_path: "/openai/v1/chat/completions",
        image_path: None,
        audio_path: Some("/openai/v1/audio/transcriptions"),
        auth: AuthScheme::Bearer,
        extra_headers: &[],
        dialect: Dialect::OpenAi,
        streaming: true,
        env_key: Some("GROQ_API_KEY"),
        default_models: &[
            "llama-3.3-70b-versatile",
            "llama-3.1-8b-instant",
            "whisper-large-v3",
        ],
    },
    ProviderSpec {
        kind: ProviderKind::Mistral,
        name: "mistral",
        display_name: "Mistral AI",
        base_url: "https://api.mistral.ai",
        chat_path: "/v1/chat/completions",
        image_path: None,
        audio_path: None,
        auth: AuthScheme::Bearer,
        extra_headers: &[],
        dialect: Dialect::OpenAi,
        streaming: true,
        env_key: Some("MISTRAL_API_KEY"),
        default_models: &["mistral-large-latest", "mistral-small-latest"],
    },
    ProviderSpec {
        kind: ProviderKind::DeepSeek,
        name: "deepseek",
        display_name: "DeepSeek",
        base_url: "https://api.deepseek.com",
        chat_path: "/chat/completions",
        image_path: None,
        audio_path: None,
        auth: AuthScheme::Bearer,
        extra_headers: &[],
        dialect: Dialect::OpenAi,
        streaming: true,
        env_key: Some("DEEPSEEK_API_KEY"),
        default_models: &["deepseek-chat", "deepseek-reasoner"],
    },
    ProviderSpec {
        kind: ProviderKind::OpenRouter,
        name: "openrouter",
        display_name: "OpenRouter",
        base_url: "https://openrouter.ai",
        chat_path: "/api/v1/chat/completions",
        image_path: None,
        audio_path: None,
        auth: AuthScheme::Bearer,
        extra_headers: &[],
        dialect: Dialect::OpenAi,
        streaming: true,
        env_key: Some("OPENROUTER_API_KEY"),
        default_models: &["openai/gpt-4o-mini", "anthropic/claude-3.5-sonnet"],
    },
    ProviderSpec {
        kind: ProviderKind::Together,
        name: "together",
        display_name: "Together AI",
        base_url: "https://api.together.xyz",
        chat_path: "/v1/chat/completions",
        image_path: Some("/v1/images/generations"),
        audio_path: None,
        auth: AuthScheme::Bearer,
        extra_headers: &[],
        dialect: Dialect::OpenAi,
        streaming: true,
        env_key: Some("TOGETHER_API_KEY"),
        default_models: &[
            "meta-llama/Llama-3.3-70B-Instruct-Turbo",
            "black-forest-labs/FLUX.1-schnell",
        ],
    },
    ProviderSpec {
        kind: ProviderKind::Xai,
        name: "xai",
        display_name: "xAI",
        base_url: "https://api.x.ai",
        chat_path: "/v1/chat/completions",
        image_path: Some("/v1/images/generations"),
        audio_path: None,
        auth: AuthScheme::Bearer,
        extra_headers: &[],
        dialect: Dialect::OpenAi,
        streaming: true,
        env_key: Some("XAI_API_KEY"),
        default_models: &["grok-2-latest", "grok-2-image"],
    },
    ProviderSpec {
        kind: ProviderKind::Cohere,
        name: "cohere",
        display_name: "Cohere",
        base_url: "https://api.cohere.com",
        chat_path: "/v2/chat",
        image_path: None,
        audio_path: None,
        auth: AuthScheme::Bearer,
        extra_headers: &[],
        dialect: Dialect::Cohere,
        streaming: true,
        env_key: Some("COHERE_API_KEY"),
        default_models: &["command-r-plus", "command-r"],
    },
];

static NAME_INDEX: LazyLock<AHashMap<&'static str, ProviderKind>> =
    LazyLock::new(|| SPECS.iter().map(|spec| (spec.name, spec.kind)).collect());

impl ProviderKind {
    pub const ALL: [ProviderKind; 11] = [
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Gemini,
        ProviderKind::Ollama,
        ProviderKind::Groq,
        ProviderKind::Mistral,
        ProviderKind::DeepSeek,
        ProviderKind::OpenRouter,
        ProviderKind::Together,
        ProviderKind::Xai,
        ProviderKind::Cohere,
    ];

    pub fn spec(&self) -> &'static ProviderSpec {
        // SPECS is declared in the same order as the enum.
        &SPECS[*self as usize]
    }

    pub fn name(&self) -> &'static str {
        self.spec().name
    }

    pub fn supports(&self, capability: Capability) -> bool {
        let spec = self.spec();
        match capability {
            Capability::Chat => true,
            Capability::ImageGeneration => spec.image_path.is_some(),
            Capability::AudioTranscription => spec.audio_path.is_some(),
        }
    }

    pub fn requires_api_key(&self) -> bool {
        self.spec().auth != AuthScheme::None
    }

    pub fn default_models(&self) -> &'static [&'static str] {
        self.spec().default_models
    }

    pub fn default_base_url(&self) -> Result<Url, WorkbenchError> {
        Ok(Url::parse(self.spec().base_url)?)
    }

    /// Full upstream URL for `capability` under `base`.
    pub fn endpoint(
        &self,
        capability: Capability,
        base: &Url,
        model: &str,
    ) -> Result<Url, WorkbenchError> {
        let path = self
            .path_for(capability, model)
            .ok_or_else(|| WorkbenchError::UnsupportedCapability {
                provider: self.name().to_string(),
                capability: capability.as_str(),
            })?;
        Ok(build_provider_url(base, &path))
    }

    /// Capability path with `{model}` substituted, if the provider offers it.
    pub fn path_for(&self, capability: Capability, model: &str) -> Option<String> {
        let spec = self.spec();
        let template = match capability {
            Capability::Chat => Some(spec.chat_path),
            Capability::ImageGeneration => spec.image_path,
            Capability::AudioTranscription => spec.audio_path,
        }?;
        Some(template.replace("{model}", model))
    }
}

impl FromStr for ProviderKind {
    type Err = WorkbenchError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        NAME_INDEX
            .get(key.as_str())
            .copied()
            .ok_or_else(|| WorkbenchError::UnsupportedProvider(s.to_string()))
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
