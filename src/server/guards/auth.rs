use crate::server::router::WorkbenchState;
use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use serde_json::json;
use subtle::ConstantTimeEq;

fn extract_header_token(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(k) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
        return Some(k.to_string());
    }
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
}

fn extract_query_token(query: Option<&str>) -> Option<String> {
    query.and_then(|q| {
        url::form_urlencoded::parse(q.as_bytes())
            .find(|(k, _)| k == "key")
            .map(|(_, v)| v.into_owned())
    })
}

/// Requires the workbench key via `x-api-key`, `Authorization: Bearer`, or `?key=`.
#[derive(Debug, Clone, Copy)]
pub struct RequireKeyAuth;

impl FromRequestParts<WorkbenchState> for RequireKeyAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &WorkbenchState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_header_token(&parts.headers)
            .or_else(|| extract_query_token(parts.uri.query()))
            .filter(|t| !t.is_empty());

        match token {
            Some(key) => {
                let expected = state.workbench_key.as_ref();
                if key.as_bytes().ct_eq(expected.as_bytes()).into() {
                    Ok(RequireKeyAuth)
                } else {
                    Err(AuthError::InvalidKey)
                }
            }
            None => Err(AuthError::MissingKey),
        }
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingKey,
    InvalidKey,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let reason = match self {
            AuthError::MissingKey => "Missing API key",
            AuthError::InvalidKey => "Invalid API key",
        };
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "unauthorized", "reason": reason })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};

    #[test]
    fn header_token_prefers_x_api_key() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer from-bearer"));
        assert_eq!(extract_header_token(&headers).as_deref(), Some("from-bearer"));

        headers.insert("x-api-key", HeaderValue::from_static("from-header"));
        assert_eq!(extract_header_token(&headers).as_deref(), Some("from-header"));
    }

    #[test]
    fn query_token_is_url_decoded() {
        assert_eq!(
            extract_query_token(Some("a=1&key=s%2Fecret")).as_deref(),
            Some("s/ecret")
        );
        assert_eq!(extract_query_token(Some("k=1")), None);
        assert_eq!(extract_query_token(None), None);
    }
}
