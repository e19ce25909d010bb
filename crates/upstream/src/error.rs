// Upstream error taxonomy
// Decision: Callers see one human-readable message per failure, never a raw upstream payload
// Decision: Transport failures are distinct from upstream non-2xx replies

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::client::Service;

/// Failure talking to an upstream service.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The endpoint for this service was not configured at startup.
    #[error("{} endpoint not configured", .0.display_name())]
    NotConfigured(Service),

    /// The request never produced a response (connect error, timeout, TLS failure).
    #[error("Unable to reach {} service", .service.display_name())]
    Unreachable {
        service: Service,
        #[source]
        source: reqwest::Error,
    },

    /// Upstream answered with a non-2xx status.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    /// Upstream answered 2xx but the body was not the shape we expect.
    #[error("{0}")]
    InvalidResponse(String),
}

impl UpstreamError {
    pub(crate) fn unrecognized(service: Service, expected: &str) -> Self {
        UpstreamError::InvalidResponse(format!(
            "Unrecognized upstream response from {} service: missing {}",
            service.display_name(),
            expected
        ))
    }
}

/// Reduce an upstream error body to a single message.
///
/// Preference order: JSON `error` string, JSON `detail` string, JSON `detail` array
/// (FastAPI validation errors, strings or `{msg}` objects joined with `"; "`), raw body
/// text, then the canonical reason phrase for `status`.
pub fn extract_error_message(status: StatusCode, body: &str) -> String {
    if let Some(message) = structured_message(body) {
        return message;
    }

    if !body.trim().is_empty() {
        return body.to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("Upstream service failed")
        .to_string()
}

/// Blank strings count as absent.
fn text(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn structured_message(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;

    if let Some(error) = parsed.get("error").and_then(text) {
        return Some(error);
    }

    match parsed.get("detail")? {
        detail @ Value::String(_) => text(detail),
        Value::Array(items) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| match item {
                    Value::String(_) => text(item),
                    other => other.get("msg").and_then(text),
                })
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}
