use url::Url;
use workbench_schema::{
    GeneratedImage, ImageOutput, ImageRequest,
    openai::{OpenaiImageRequest, OpenaiImageResponse},
};

use super::authorize;
use crate::error::WorkbenchError;
use crate::providers::ProviderKind;

/// Every image-capable provider speaks the OpenAI images dialect.
pub(crate) fn build_image_request(
    http: &reqwest::Client,
    kind: ProviderKind,
    url: &Url,
    api_key: Option<&str>,
    req: &ImageRequest,
) -> Result<reqwest::Request, WorkbenchError> {
    let body = OpenaiImageRequest {
        model: req.model.clone(),
        prompt: req.prompt.clone(),
        n: req.n.unwrap_or(1),
        size: req.size.clone(),
    };
    Ok(authorize(http.post(url.clone()), kind, api_key)
        .json(&body)
        .build()?)
}

pub(crate) fn parse_image_response(body: &[u8]) -> Result<ImageOutput, WorkbenchError> {
    let resp: OpenaiImageResponse = serde_json::from_slice(body)?;
    Ok(ImageOutput {
        images: resp
            .data
            .into_iter()
            .map(|d| GeneratedImage {
                url: d.url,
                b64_json: d.b64_json,
                revised_prompt: d.revised_prompt,
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn body_defaults_n_to_one() {
        let http = reqwest::Client::new();
        let url = Url::parse("http://example.test/v1/images/generations").expect("url");
        let req = build_image_request(
            &http,
            ProviderKind::Xai,
            &url,
            Some("xk"),
            &ImageRequest {
                provider: "xai".to_string(),
                model: "grok-2-image".to_string(),
                prompt: "a lighthouse".to_string(),
                n: None,
                size: None,
            },
        )
        .expect("build");

        let body: Value = serde_json::from_slice(
            req.body()
                .and_then(reqwest::Body::as_bytes)
                .expect("buffered body"),
        )
        .expect("json");
        assert_eq!(body["n"], 1);
        assert!(body.get("size").is_none());
        assert_eq!(
            req.headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok()),
            Some("Bearer xk")
        );
    }

    #[test]
    fn parses_url_and_b64_entries() {
        let out = parse_image_response(
            br#"{"created":1,"data":[{"url":"https://img/1.png","revised_prompt":"r"},{"b64_json":"AAAA"}]}"#,
        )
        .expect("parse");

        assert_eq!(out.images.len(), 2);
        assert_eq!(out.images[0].url.as_deref(), Some("https://img/1.png"));
        assert_eq!(out.images[0].revised_prompt.as_deref(), Some("r"));
        assert_eq!(out.images[1].b64_json.as_deref(), Some("AAAA"));
    }
}
