//! Best-effort view over upstream error payloads.
//!
//! Vendors disagree on the envelope:
//! - OpenAI-compatible / Anthropic / Gemini: `{ "error": { "message": "..." } }`
//! - Ollama: `{ "error": "..." }`
//! - Cohere: `{ "message": "..." }`
//!
//! Unrecognized shapes still deserialize; `message()` then returns `None`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize, Serialize)]
pub struct UpstreamErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<UpstreamErrorField>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(flatten)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum UpstreamErrorField {
    Text(String),
    Object {
        #[serde(default)]
        message: Option<String>,
        #[serde(flatten)]
        extra: BTreeMap<String, Value>,
    },
}

impl UpstreamErrorBody {
    pub fn message(&self) -> Option<&str> {
        let nested = match &self.error {
            Some(UpstreamErrorField::Text(text)) => Some(text.as_str()),
            Some(UpstreamErrorField::Object { message, .. }) => message.as_deref(),
            None => None,
        };
        nested
            .or(self.message.as_deref())
            .filter(|m| !m.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message_of(raw: &str) -> Option<String> {
        serde_json::from_str::<UpstreamErrorBody>(raw)
            .expect("parse sample")
            .message()
            .map(str::to_string)
    }

    #[test]
    fn extracts_message_from_known_envelopes() {
        assert_eq!(
            message_of(r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#)
                .as_deref(),
            Some("Incorrect API key provided")
        );
        assert_eq!(
            message_of(r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#)
                .as_deref(),
            Some("Overloaded")
        );
        assert_eq!(
            message_of(r#"{"error":"model 'llama9' not found"}"#).as_deref(),
            Some("model 'llama9' not found")
        );
        assert_eq!(
            message_of(r#"{"id":"x","message":"invalid api token"}"#).as_deref(),
            Some("invalid api token")
        );
    }

    #[test]
    fn unknown_shape_has_no_message() {
        assert_eq!(message_of(r#"{"detail":"nope"}"#), None);
    }
}
