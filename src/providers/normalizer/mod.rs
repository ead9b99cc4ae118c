//! Per-capability translation between the neutral request shapes and each
//! provider's wire dialect.
//!
//! `build_*` produce a ready-to-send [`reqwest::Request`]; `parse_*` read a
//! 2xx body back into the neutral output shape.

pub(crate) mod audio;
pub(crate) mod chat;
pub(crate) mod image;

use reqwest::{RequestBuilder, header::AUTHORIZATION};

use super::{AuthScheme, ProviderKind};
use crate::error::WorkbenchError;

/// Attaches the provider's auth header (if any) and its static headers.
pub(crate) fn authorize(
    mut builder: RequestBuilder,
    kind: ProviderKind,
    api_key: Option<&str>,
) -> RequestBuilder {
    let spec = kind.spec();
    if let Some(key) = api_key {
        builder = match spec.auth {
            AuthScheme::Bearer => builder.header(AUTHORIZATION, format!("Bearer {key}")),
            AuthScheme::Header(name) => builder.header(name, key),
            AuthScheme::None => builder,
        };
    }
    for (name, value) in spec.extra_headers {
        builder = builder.header(*name, *value);
    }
    builder
}

/// A 2xx body that does not carry what the dialect promises.
pub(crate) fn bad_payload(detail: &str) -> WorkbenchError {
    WorkbenchError::JsonError(<serde_json::Error as serde::de::Error>::custom(detail))
}
