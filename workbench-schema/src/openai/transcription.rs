use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// `/v1/audio/transcriptions` JSON response (default `response_format`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenaiTranscriptionResponse {
    pub text: String,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}
