//! Parsed responses and the backend envelope

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response handed back to callers and stored in the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status: u16,
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ApiResponse {
    pub fn new(status: u16, data: Value) -> Self {
        Self { status, data, message: None, code: None }
    }

    /// Deserialize `data` into a concrete type
    pub fn data_as<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.data.clone())
    }
}

/// `{success, data, message?, code?}` wrapper used by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// Body of a 2xx response after parsing
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// A JSON object carrying a boolean `success` field
    Envelope(ResponseEnvelope),
    /// Anything else, returned to the caller as `data`
    Raw(Value),
}

impl ResponseBody {
    /// Classify raw response bytes
    ///
    /// An empty body becomes `Raw(Null)`; text that is not JSON becomes a JSON
    /// string.
    pub fn parse(bytes: &[u8]) -> Self {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Self::Raw(Value::Null);
        }

        match serde_json::from_slice::<Value>(bytes) {
            Ok(value) => Self::from_value(value),
            Err(_) => Self::Raw(Value::String(String::from_utf8_lossy(bytes).into_owned())),
        }
    }

    /// Any object whose `success` field is a boolean is an envelope
    ///
    /// `message` and `code` are read leniently: numbers and booleans become
    /// their text, while null, arrays and objects are dropped. A malformed
    /// failure envelope still reads as a failure.
    pub fn from_value(value: Value) -> Self {
        let Some(success) = value.get("success").and_then(Value::as_bool) else {
            return Self::Raw(value);
        };

        let Value::Object(mut fields) = value else {
            return Self::Raw(value);
        };
        Self::Envelope(ResponseEnvelope {
            success,
            data: fields.remove("data").unwrap_or(Value::Null),
            message: fields.remove("message").and_then(lenient_text),
            code: fields.remove("code").and_then(lenient_text),
        })
    }
}

fn lenient_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_body_is_null_data() {
        assert_eq!(ResponseBody::parse(b""), ResponseBody::Raw(Value::Null));
        assert_eq!(ResponseBody::parse(b"  \n"), ResponseBody::Raw(Value::Null));
    }

    #[test]
    fn envelope_is_detected() {
        let body = br#"{"success":true,"data":{"name":"Ada"},"message":"ok"}"#;
        match ResponseBody::parse(body) {
            ResponseBody::Envelope(env) => {
                assert!(env.success);
                assert_eq!(env.data, json!({"name": "Ada"}));
                assert_eq!(env.message.as_deref(), Some("ok"));
            }
            other => panic!("expected envelope, got {other:?}"),
        }
    }

    #[test]
    fn envelope_fields_are_read_leniently() {
        let body = br#"{"success":false,"message":"Email is invalid","code":422}"#;
        assert_eq!(
            ResponseBody::parse(body),
            ResponseBody::Envelope(ResponseEnvelope {
                success: false,
                data: Value::Null,
                message: Some("Email is invalid".into()),
                code: Some("422".into()),
            })
        );

        let body = br#"{"success":false,"message":{"detail":"x"},"code":null}"#;
        match ResponseBody::parse(body) {
            ResponseBody::Envelope(env) => {
                assert!(!env.success);
                assert_eq!(env.message, None);
                assert_eq!(env.code, None);
            }
            other => panic!("expected envelope, got {other:?}"),
        }
    }

    #[test]
    fn non_envelope_json_is_raw() {
        let body = br#"{"success":"yes","items":[1,2]}"#;
        assert_eq!(
            ResponseBody::parse(body),
            ResponseBody::Raw(json!({"success": "yes", "items": [1, 2]}))
        );
        assert_eq!(ResponseBody::parse(b"[1,2,3]"), ResponseBody::Raw(json!([1, 2, 3])));
    }

    #[test]
    fn plain_text_is_raw_string() {
        assert_eq!(ResponseBody::parse(b"pong"), ResponseBody::Raw(json!("pong")));
    }
}
