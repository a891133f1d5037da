//! User-facing error messages
//!
//! Raw server error text is only forwarded when it matches a small allow-list
//! of safe keywords, and is truncated. Everything else gets a generic message
//! chosen by status.

use courier_domain::constants::MAX_ERROR_MESSAGE_LENGTH;
use courier_domain::{EngineError, ResponseBody};
use once_cell::sync::Lazy;
use regex::Regex;

use super::retry::RetryPolicy;

#[allow(clippy::expect_used)]
static SAFE_MESSAGE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(validation|expired|invalid|required|already exists|too long|too short)\b")
        .expect("SAFE_MESSAGE_REGEX should compile - this is a bug")
});

/// Generic message for an HTTP status
pub fn status_message(status: u16) -> &'static str {
    match status {
        400 => "The request was invalid.",
        401 => "Authentication required. Please sign in again.",
        403 => "You do not have permission to perform this action.",
        404 => "The requested resource was not found.",
        408 => "The request timed out. Please try again.",
        409 => "The request conflicts with the current state of the resource.",
        422 => "The submitted data could not be processed.",
        429 => "Too many requests. Please wait and try again.",
        500 => "The server encountered an internal error.",
        502 => "The server received an invalid response from an upstream service.",
        503 => "The service is temporarily unavailable. Please try again later.",
        504 => "The server took too long to respond.",
        500..=599 => "The server encountered an error.",
        400..=499 => "The request could not be completed.",
        _ => "The request failed.",
    }
}

/// Whether raw server text may be shown to the user
pub fn is_safe_message(raw: &str) -> bool {
    SAFE_MESSAGE_REGEX.is_match(raw)
}

/// Message to surface for `status`, given optional raw server text
pub fn sanitize_message(status: u16, raw: Option<&str>) -> String {
    match raw.map(str::trim).filter(|text| !text.is_empty()) {
        Some(text) if is_safe_message(text) => truncate(text, MAX_ERROR_MESSAGE_LENGTH),
        _ => status_message(status).to_string(),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

/// `RequestFailed` for a non-2xx response
///
/// Reads `message` (or `error`) and `code` from a JSON body when present.
pub fn error_from_status(status: u16, body: &[u8]) -> EngineError {
    let (raw_message, code) = match ResponseBody::parse(body) {
        ResponseBody::Envelope(envelope) => (envelope.message, envelope.code),
        ResponseBody::Raw(serde_json::Value::String(text)) => (Some(text), None),
        ResponseBody::Raw(value) => {
            let field = |name: &str| value.get(name).and_then(|v| v.as_str()).map(str::to_string);
            (field("message").or_else(|| field("error")), field("code"))
        }
    };

    EngineError::RequestFailed {
        status,
        message: sanitize_message(status, raw_message.as_deref()),
        code,
        retriable: RetryPolicy::is_retryable_status(status),
    }
}

/// `RequestFailed` for a 2xx envelope carrying `success: false`
pub fn error_from_envelope(status: u16, message: Option<&str>, code: Option<String>) -> EngineError {
    let message = match message.map(str::trim).filter(|m| !m.is_empty()) {
        Some(text) if is_safe_message(text) => truncate(text, MAX_ERROR_MESSAGE_LENGTH),
        _ => "The server could not complete the request.".to_string(),
    };
    EngineError::RequestFailed { status, message, code, retriable: false }
}
