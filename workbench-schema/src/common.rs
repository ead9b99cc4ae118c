//! Provider-neutral request and response shapes.
//!
//! Every inbound call names a provider and a model; the server translates these
//! into the provider's own wire format and translates the answer back into one of
//! the output types below.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }

    /// Parses a stored role string. Matching is exact (lowercase).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "system" => Some(ChatRole::System),
            "user" => Some(ChatRole::User),
            "assistant" => Some(ChatRole::Assistant),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Inbound chat completion request.
///
/// Either `messages` or `prompt` must carry content. When both are present the
/// prompt is appended as the final user turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Returns the full conversation sent upstream.
    pub fn conversation(&self) -> Vec<ChatMessage> {
        let mut out = self.messages.clone();
        if let Some(prompt) = self.prompt.as_deref().filter(|p| !p.trim().is_empty()) {
            out.push(ChatMessage::new(ChatRole::User, prompt));
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatOutput {
    pub text: String,
    pub provider: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Single-prompt completion, answered through the provider's chat endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub provider: String,
    pub model: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl From<CompletionRequest> for ChatRequest {
    fn from(req: CompletionRequest) -> Self {
        ChatRequest {
            provider: req.provider,
            model: req.model,
            messages: Vec::new(),
            prompt: Some(req.prompt),
            temperature: req.temperature,
            max_tokens: req.max_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOutput {
    pub completion: String,
    pub provider: String,
    pub model: String,
}

impl From<ChatOutput> for CompletionOutput {
    fn from(out: ChatOutput) -> Self {
        CompletionOutput {
            completion: out.text,
            provider: out.provider,
            model: out.model,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    pub provider: String,
    pub model: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b64_json: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revised_prompt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageOutput {
    pub images: Vec<GeneratedImage>,
}

/// Audio arrives base64-encoded inside the JSON body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionRequest {
    pub provider: String,
    pub model: String,
    pub audio_base64: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionOutput {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_appends_prompt_after_messages() {
        let req = ChatRequest {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            messages: vec![ChatMessage::new(ChatRole::System, "be brief")],
            prompt: Some("hello".to_string()),
            temperature: None,
            max_tokens: None,
        };

        let conversation = req.conversation();
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation[1], ChatMessage::new(ChatRole::User, "hello"));
    }

    #[test]
    fn blank_prompt_is_ignored() {
        let req: ChatRequest = serde_json::from_str(
            r#"{"provider":"ollama","model":"llama3","messages":[{"role":"user","content":"hi"}],"prompt":"  "}"#,
        )
        .expect("parse request");

        assert_eq!(req.conversation().len(), 1);
    }

    #[test]
    fn role_parse_is_exact() {
        assert_eq!(ChatRole::parse("assistant"), Some(ChatRole::Assistant));
        assert_eq!(ChatRole::parse("Assistant"), None);
    }
}
