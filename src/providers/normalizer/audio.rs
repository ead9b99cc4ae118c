use base64::Engine as _;
use reqwest::multipart::{Form, Part};
use url::Url;
use workbench_schema::{
    TranscriptionOutput, TranscriptionRequest, openai::OpenaiTranscriptionResponse,
};

use super::authorize;
use crate::error::WorkbenchError;
use crate::providers::ProviderKind;

const DEFAULT_AUDIO_FILE_NAME: &str = "audio.webm";

/// Decodes the inline base64 audio; accepts standard and URL-safe alphabets.
pub(crate) fn decode_audio(audio_base64: &str) -> Result<Vec<u8>, WorkbenchError> {
    let trimmed = audio_base64.trim();
    // Strip a `data:audio/...;base64,` prefix if the client sent a data URL.
    let payload = trimmed
        .split_once(";base64,")
        .map_or(trimmed, |(_, data)| data);

    let audio = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .or_else(|_| base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(payload))
        .map_err(|e| WorkbenchError::Validation(format!("audio_base64 is not valid base64: {e}")))?;

    if audio.is_empty() {
        return Err(WorkbenchError::Validation(
            "audio_base64 decodes to an empty file".to_string(),
        ));
    }
    Ok(audio)
}

/// `multipart/form-data` with `file`, `model` and optional `language`.
pub(crate) fn build_transcription_request(
    http: &reqwest::Client,
    kind: ProviderKind,
    url: &Url,
    api_key: Option<&str>,
    req: &TranscriptionRequest,
) -> Result<reqwest::Request, WorkbenchError> {
    let audio = decode_audio(&req.audio_base64)?;
    let file_name = req
        .file_name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(DEFAULT_AUDIO_FILE_NAME)
        .to_string();

    let mut form = Form::new()
        .part("file", Part::bytes(audio).file_name(file_name))
        .text("model", req.model.clone());
    if let Some(language) = req.language.as_deref().filter(|l| !l.trim().is_empty()) {
        form = form.text("language", language.to_string());
    }

    Ok(authorize(http.post(url.clone()), kind, api_key)
        .multipart(form)
        .build()?)
}

pub(crate) fn parse_transcription_response(
    body: &[u8],
) -> Result<TranscriptionOutput, WorkbenchError> {
    let resp: OpenaiTranscriptionResponse = serde_json::from_slice(body)?;
    Ok(TranscriptionOutput { text: resp.text })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_and_data_url_base64() {
        assert_eq!(decode_audio("aGVsbG8=").expect("plain"), b"hello");
        assert_eq!(
            decode_audio("data:audio/wav;base64,aGVsbG8=").expect("data url"),
            b"hello"
        );
    }

    #[test]
    fn rejects_garbage_and_empty_audio() {
        assert!(matches!(
            decode_audio("not base64 at all!"),
            Err(WorkbenchError::Validation(_))
        ));
        assert!(matches!(decode_audio(""), Err(WorkbenchError::Validation(_))));
    }

    #[test]
    fn request_is_multipart_with_bearer() {
        let http = reqwest::Client::new();
        let url = Url::parse("http://example.test/openai/v1/audio/transcriptions").expect("url");
        let req = build_transcription_request(
            &http,
            ProviderKind::Groq,
            &url,
            Some("gsk"),
            &TranscriptionRequest {
                provider: "groq".to_string(),
                model: "whisper-large-v3".to_string(),
                audio_base64: "aGVsbG8=".to_string(),
                file_name: Some("clip.wav".to_string()),
                language: Some("en".to_string()),
            },
        )
        .expect("build");

        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(content_type.starts_with("multipart/form-data; boundary="));
        assert_eq!(
            req.headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok()),
            Some("Bearer gsk")
        );
    }

    #[test]
    fn parses_text() {
        let out = parse_transcription_response(br#"{"text":"hello world","x_groq":{"id":"1"}}"#)
            .expect("parse");
        assert_eq!(out.text, "hello world");
    }
}
