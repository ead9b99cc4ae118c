use url::Url;
use workbench_schema::{
    ChatMessage, ChatRequest, ChatRole,
    anthropic::{
        ANTHROPIC_DEFAULT_MAX_TOKENS, AnthropicMessage, AnthropicMessagesRequest,
        AnthropicMessagesResponse,
    },
    cohere::{CohereChatRequest, CohereChatResponse, CohereMessage},
    gemini::{
        GeminiContent, GeminiGenerateContentRequest, GeminiGenerateContentResponse,
        GeminiGenerationConfig,
    },
    ollama::{OllamaChatRequest, OllamaChatResponse, OllamaMessage, OllamaOptions},
    openai::{OpenaiChatMessage, OpenaiChatRequest, OpenaiChatResponse},
};

use super::{authorize, bad_payload};
use crate::error::WorkbenchError;
use crate::providers::{Dialect, ProviderKind};

/// Assistant text plus the vendor's stop reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedChat {
    pub text: String,
    pub finish_reason: Option<String>,
}

/// Joins every system turn into one instruction string; returns the rest untouched.
fn split_system(conversation: Vec<ChatMessage>) -> (Option<String>, Vec<ChatMessage>) {
    let (system, turns): (Vec<_>, Vec<_>) = conversation
        .into_iter()
        .partition(|m| m.role == ChatRole::System);
    let system = system
        .into_iter()
        .map(|m| m.content)
        .filter(|c| !c.trim().is_empty())
        .collect::<Vec<_>>();
    let system = (!system.is_empty()).then(|| system.join("\n\n"));
    (system, turns)
}

pub(crate) fn build_chat_request(
    http: &reqwest::Client,
    kind: ProviderKind,
    url: &Url,
    api_key: Option<&str>,
    req: &ChatRequest,
) -> Result<reqwest::Request, WorkbenchError> {
    let builder = authorize(http.post(url.clone()), kind, api_key);
    let conversation = req.conversation();

    let builder = match kind.spec().dialect {
        Dialect::OpenAi => builder.json(&OpenaiChatRequest {
            model: req.model.clone(),
            messages: conversation
                .into_iter()
                .map(|m| OpenaiChatMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content,
                })
                .collect(),
            temperature: req.temperature,
            max_tokens: req.max_tokens,
            stream: false,
        }),

        Dialect::Anthropic => {
            let (system, turns) = split_system(conversation);
            builder.json(&AnthropicMessagesRequest {
                model: req.model.clone(),
                system,
                messages: turns
                    .into_iter()
                    .map(|m| AnthropicMessage {
                        role: m.role.as_str().to_string(),
                        content: m.content,
                    })
                    .collect(),
                max_tokens: req.max_tokens.unwrap_or(ANTHROPIC_DEFAULT_MAX_TOKENS),
                temperature: req.temperature,
            })
        }

        Dialect::Gemini => {
            let (system, turns) = split_system(conversation);
            let generation_config = GeminiGenerationConfig {
                temperature: req.temperature,
                max_output_tokens: req.max_tokens,
            };
            builder.json(&GeminiGenerateContentRequest {
                contents: turns
                    .into_iter()
                    .map(|m| {
                        let role = match m.role {
                            ChatRole::Assistant => "model",
                            ChatRole::User | ChatRole::System => "user",
                        };
                        GeminiContent::text(Some(role), m.content)
                    })
                    .collect(),
                system_instruction: system.map(|text| GeminiContent::text(None, text)),
                generation_config: (!generation_config.is_empty()).then_some(generation_config),
            })
        }

        Dialect::Ollama => {
            let options = (req.temperature.is_some() || req.max_tokens.is_some()).then(|| {
                OllamaOptions {
                    temperature: req.temperature,
                    num_predict: req.max_tokens,
                }
            });
            builder.json(&OllamaChatRequest {
                model: req.model.clone(),
                messages: conversation
                    .into_iter()
                    .map(|m| OllamaMessage {
                        role: m.role.as_str().to_string(),
                        content: m.content,
                    })
                    .collect(),
                stream: false,
                options,
            })
        }

        Dialect::Cohere => builder.json(&CohereChatRequest {
            model: req.model.clone(),
            messages: conversation
                .into_iter()
                .map(|m| CohereMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content,
                })
                .collect(),
            temperature: req.temperature,
            max_tokens: req.max_tokens,
        }),
    };

    Ok(builder.build()?)
}

pub(crate) fn parse_chat_response(
    kind: ProviderKind,
    body: &[u8],
) -> Result<ParsedChat, WorkbenchError> {
    let parsed = match kind.spec().dialect {
        Dialect::OpenAi => {
            let resp: OpenaiChatResponse = serde_json::from_slice(body)?;
            if resp.choices.is_empty() {
                return Err(bad_payload("response has no choices"));
            }
            ParsedChat {
                text: resp.first_text().unwrap_or_default().to_string(),
                finish_reason: resp.first_finish_reason().map(str::to_string),
            }
        }

        Dialect::Anthropic => {
            let resp: AnthropicMessagesResponse = serde_json::from_slice(body)?;
            ParsedChat {
                text: resp.text(),
                finish_reason: resp.stop_reason,
            }
        }

        Dialect::Gemini => {
            let resp: GeminiGenerateContentResponse = serde_json::from_slice(body)?;
            let text = resp
                .text()
                .ok_or_else(|| bad_payload("response has no candidates"))?;
            ParsedChat {
                finish_reason: resp.finish_reason().map(str::to_string),
                text,
            }
        }

        Dialect::Ollama => {
            let resp: OllamaChatResponse = serde_json::from_slice(body)?;
            let message = resp
                .message
                .ok_or_else(|| bad_payload("response has no message"))?;
            ParsedChat {
                text: message.content,
                finish_reason: resp.done_reason,
            }
        }

        Dialect::Cohere => {
            let resp: CohereChatResponse = serde_json::from_slice(body)?;
            let text = resp
                .text()
                .ok_or_else(|| bad_payload("response has no message"))?;
            ParsedChat {
                text,
                finish_reason: resp.finish_reason,
            }
        }
    };

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;
    use serde_json::{Value, json};

    fn request(provider: &str, messages: Vec<ChatMessage>) -> ChatRequest {
        ChatRequest {
            provider: provider.to_string(),
            model: "m-1".to_string(),
            messages,
            prompt: None,
            temperature: Some(0.5),
            max_tokens: None,
        }
    }

    fn body_json(req: &reqwest::Request) -> Value {
        let bytes = req
            .body()
            .and_then(reqwest::Body::as_bytes)
            .expect("buffered body");
        serde_json::from_slice(bytes).expect("json body")
    }

    fn header<'a>(req: &'a reqwest::Request, name: &str) -> Option<&'a str> {
        req.headers().get(name).and_then(|v| v.to_str().ok())
    }

    fn conversation() -> Vec<ChatMessage> {
        vec![
            ChatMessage::new(ChatRole::System, "be brief"),
            ChatMessage::new(ChatRole::User, "hi"),
            ChatMessage::new(ChatRole::Assistant, "hello"),
            ChatMessage::new(ChatRole::User, "bye"),
        ]
    }

    #[test]
    fn openai_dialect_sets_bearer_and_messages() {
        let http = reqwest::Client::new();
        let url = Url::parse("http://example.test/v1/chat/completions").expect("url");
        let req = build_chat_request(
            &http,
            ProviderKind::OpenAi,
            &url,
            Some("sk-test"),
            &request("openai", conversation()),
        )
        .expect("build");

        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.url(), &url);
        assert_eq!(header(&req, "authorization"), Some("Bearer sk-test"));

        let body = body_json(&req);
        assert_eq!(body["model"], "m-1");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"].as_array().map(Vec::len), Some(4));
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn anthropic_dialect_lifts_system_and_defaults_max_tokens() {
        let http = reqwest::Client::new();
        let url = Url::parse("http://example.test/v1/messages").expect("url");
        let req = build_chat_request(
            &http,
            ProviderKind::Anthropic,
            &url,
            Some("ak"),
            &request("anthropic", conversation()),
        )
        .expect("build");

        assert_eq!(header(&req, "x-api-key"), Some("ak"));
        assert_eq!(header(&req, "anthropic-version"), Some("2023-06-01"));
        assert!(req.headers().get("authorization").is_none());

        let body = body_json(&req);
        assert_eq!(body["system"], "be brief");
        assert_eq!(body["max_tokens"], 1024);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn gemini_dialect_maps_roles_and_generation_config() {
        let http = reqwest::Client::new();
        let url = Url::parse("http://example.test/v1beta/models/m-1:generateContent").expect("url");
        let mut chat = request("gemini", conversation());
        chat.max_tokens = Some(64);
        let req = build_chat_request(&http, ProviderKind::Gemini, &url, Some("gk"), &chat)
            .expect("build");

        assert_eq!(header(&req, "x-goog-api-key"), Some("gk"));
        let body = body_json(&req);
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][2]["parts"][0]["text"], "bye");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 64);
    }

    #[test]
    fn ollama_dialect_has_no_auth_and_options() {
        let http = reqwest::Client::new();
        let url = Url::parse("http://localhost:11434/api/chat").expect("url");
        let req = build_chat_request(
            &http,
            ProviderKind::Ollama,
            &url,
            None,
            &request("ollama", conversation()),
        )
        .expect("build");

        assert!(req.headers().get("authorization").is_none());
        let body = body_json(&req);
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["temperature"], 0.5);
        assert!(body["options"].get("num_predict").is_none());
    }

    #[test]
    fn parses_each_dialect() {
        let openai = json!({"choices":[{"message":{"role":"assistant","content":"hi"},"finish_reason":"stop"}]});
        let anthropic = json!({"content":[{"type":"text","text":"he"},{"type":"tool_use","id":"x"},{"type":"text","text":"llo"}],"stop_reason":"end_turn"});
        let gemini = json!({"candidates":[{"content":{"role":"model","parts":[{"text":"g"},{"text":"m"}]},"finishReason":"STOP"}]});
        let ollama = json!({"model":"llama3","message":{"role":"assistant","content":"o"},"done_reason":"stop","done":true});
        let cohere = json!({"message":{"role":"assistant","content":[{"type":"text","text":"c"}]},"finish_reason":"COMPLETE"});

        let cases = [
            (ProviderKind::Groq, openai, "hi", "stop"),
            (ProviderKind::Anthropic, anthropic, "hello", "end_turn"),
            (ProviderKind::Gemini, gemini, "gm", "STOP"),
            (ProviderKind::Ollama, ollama, "o", "stop"),
            (ProviderKind::Cohere, cohere, "c", "COMPLETE"),
        ];

        for (kind, body, text, reason) in cases {
            let parsed = parse_chat_response(kind, body.to_string().as_bytes())
                .unwrap_or_else(|e| panic!("{kind}: {e}"));
            assert_eq!(parsed.text, text, "{kind}");
            assert_eq!(parsed.finish_reason.as_deref(), Some(reason), "{kind}");
        }
    }

    #[test]
    fn empty_or_malformed_bodies_are_bad_payloads() {
        let err = parse_chat_response(ProviderKind::OpenAi, br#"{"choices":[]}"#)
            .expect_err("no choices");
        assert!(matches!(err, WorkbenchError::JsonError(_)));

        let err = parse_chat_response(ProviderKind::Gemini, b"<html>").expect_err("not json");
        assert!(matches!(err, WorkbenchError::JsonError(_)));
    }
}
