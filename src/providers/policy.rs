use axum::body::Bytes;
use std::fmt::Display;
use workbench_schema::UpstreamErrorBody;

use crate::{error::WorkbenchError, utils::logging::with_pretty_json_debug};

pub const UPSTREAM_BODY_PREVIEW_CHARS: usize = 300;

/// Turns a non-2xx upstream response into [`WorkbenchError::Upstream`].
///
/// The status is kept as-is. The message is the vendor's error text when the
/// body has a recognizable error shape, else the raw body, else the reason phrase.
pub(crate) async fn upstream_error(source: impl Display, resp: reqwest::Response) -> WorkbenchError {
    let status = resp.status();
    let bytes = resp.bytes().await.unwrap_or_default();
    let raw_body = String::from_utf8_lossy(&bytes).into_owned();

    if let Ok(body) = serde_json::from_slice::<UpstreamErrorBody>(&bytes)
        && let Some(message) = body.message()
    {
        with_pretty_json_debug(&body, |pretty| {
            tracing::debug!(
                %source,
                %status,
                body = %pretty,
                "Upstream structured error"
            );
        });
        return WorkbenchError::Upstream {
            status,
            message: message.to_string(),
        };
    }

    tracing::debug!(
        %source,
        %status,
        body = %format!("{:.len$}", raw_body, len = UPSTREAM_BODY_PREVIEW_CHARS),
        "Upstream unstructured error"
    );

    let trimmed = raw_body.trim();
    let message = if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("upstream error")
            .to_string()
    } else {
        trimmed.to_string()
    };
    WorkbenchError::Upstream { status, message }
}

/// Reads a 2xx body, mapping everything else through [`upstream_error`].
pub(crate) async fn success_bytes(
    source: impl Display,
    resp: reqwest::Response,
) -> Result<Bytes, WorkbenchError> {
    if !resp.status().is_success() {
        return Err(upstream_error(source, resp).await);
    }
    Ok(resp.bytes().await?)
}
