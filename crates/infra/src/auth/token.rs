//! Token validation and JWT expiry decoding

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, TimeZone, Utc};
use courier_common::time::Clock;
use courier_domain::constants::{BEARER_PREFIX, MIN_TOKEN_LENGTH};
use courier_domain::{EngineError, EngineResult};
use serde::Deserialize;

/// A validated bearer credential
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    raw: String,
    expires_at: Option<DateTime<Utc>>,
}

impl AuthToken {
    /// Validate `raw` and decode its expiry
    ///
    /// Fails with `InvalidTokenFormat` when the token is too short, contains
    /// whitespace, is a malformed JWT, or its `exp` claim is not in the future.
    pub fn parse(raw: &str, clock: &dyn Clock) -> EngineResult<Self> {
        validate_format(raw)?;

        let expires_at = decode_jwt_expiry(raw)?;
        if let Some(expiry) = expires_at {
            if expiry.timestamp() <= clock.secs_since_epoch() {
                return Err(EngineError::InvalidTokenFormat(format!(
                    "token expired at {}",
                    expiry.to_rfc3339()
                )));
            }
        }

        Ok(Self { raw: raw.to_string(), expires_at })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// `Authorization` header value
    pub fn bearer(&self) -> String {
        format!("{BEARER_PREFIX}{}", self.raw)
    }
}

// Never print the credential itself
impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("len", &self.raw.len())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

fn validate_format(raw: &str) -> EngineResult<()> {
    if raw.is_empty() {
        return Err(EngineError::InvalidTokenFormat("token is empty".into()));
    }
    if raw.chars().count() < MIN_TOKEN_LENGTH {
        return Err(EngineError::InvalidTokenFormat(format!(
            "token shorter than {MIN_TOKEN_LENGTH} characters"
        )));
    }
    if raw.chars().any(char::is_whitespace) {
        return Err(EngineError::InvalidTokenFormat("token contains whitespace".into()));
    }
    Ok(())
}

#[derive(Deserialize)]
struct Claims {
    exp: Option<serde_json::Number>,
}

/// `exp` of a three-segment token, `None` for opaque tokens
fn decode_jwt_expiry(raw: &str) -> EngineResult<Option<DateTime<Utc>>> {
    let segments: Vec<&str> = raw.split('.').collect();
    if segments.len() != 3 {
        return Ok(None);
    }

    let payload = URL_SAFE_NO_PAD
        .decode(segments[1].trim_end_matches('='))
        .map_err(|e| EngineError::InvalidTokenFormat(format!("JWT payload is not base64url: {e}")))?;
    let claims: Claims = serde_json::from_slice(&payload)
        .map_err(|e| EngineError::InvalidTokenFormat(format!("JWT payload is not JSON: {e}")))?;

    let Some(exp) = claims.exp else {
        return Ok(None);
    };
    let seconds = exp
        .as_i64()
        .or_else(|| exp.as_f64().map(|f| f as i64))
        .ok_or_else(|| EngineError::InvalidTokenFormat("JWT exp is not a number".into()))?;

    Utc.timestamp_opt(seconds, 0)
        .single()
        .map(Some)
        .ok_or_else(|| EngineError::InvalidTokenFormat(format!("JWT exp out of range: {seconds}")))
}
