use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Chat Completions request body, shared by every OpenAI-compatible vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenaiChatRequest {
    pub model: String,
    pub messages: Vec<OpenaiChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenaiChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenaiChatResponse {
    #[serde(default)]
    pub choices: Vec<OpenaiChatChoice>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenaiChatChoice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<OpenaiChoiceMessage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenaiChoiceMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// `null` when the model answered with tool calls only.
    #[serde(default)]
    pub content: Option<String>,
}

impl OpenaiChatResponse {
    pub fn first_text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
    }

    pub fn first_finish_reason(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.finish_reason.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_null_content_and_keeps_unknown_fields() {
        let raw = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "model": "gpt-4o-mini",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": null}, "finish_reason": "tool_calls"}]
        }"#;
        let resp: OpenaiChatResponse = serde_json::from_str(raw).expect("parse sample");

        assert_eq!(resp.first_text(), None);
        assert_eq!(resp.first_finish_reason(), Some("tool_calls"));
        assert!(resp.extra.contains_key("id"));
    }

    #[test]
    fn request_omits_unset_sampling_fields() {
        let req = OpenaiChatRequest {
            model: "m".to_string(),
            messages: vec![],
            temperature: None,
            max_tokens: Some(16),
            stream: false,
        };
        let json = serde_json::to_value(&req).expect("serialize");

        assert!(json.get("temperature").is_none());
        assert_eq!(json["max_tokens"], 16);
        assert_eq!(json["stream"], false);
    }
}
