//! Request description types
//!
//! A [`RequestDescriptor`] is built once and then only replaced, never edited
//! in place: interceptors that want to change a request return a new one via
//! the `with_*` methods.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{EngineError, EngineResult};
use crate::impl_wire_name_conversions;

/// HTTP verbs the engine issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Head,
    Options,
    Post,
    Put,
    Patch,
    Delete,
}

impl_wire_name_conversions!(HttpMethod {
    Get => "GET",
    Head => "HEAD",
    Options => "OPTIONS",
    Post => "POST",
    Put => "PUT",
    Patch => "PATCH",
    Delete => "DELETE",
});

impl HttpMethod {
    /// POST, PUT, PATCH and DELETE change server state and are never cached
    pub fn is_mutating(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch | Self::Delete)
    }
}

/// Header map with case-insensitive names
///
/// Names are stored lowercased, so `Authorization` and `authorization` refer to
/// the same entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing any value stored under the same name
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.as_ref().to_ascii_lowercase(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&name.to_ascii_lowercase())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.0.remove(&name.to_ascii_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// Everything needed to issue one logical request
///
/// `max_retries` and `timeout_ms` fall back to the engine configuration when
/// unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDescriptor {
    method: HttpMethod,
    endpoint: String,
    #[serde(default)]
    headers: Headers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    body: Option<Value>,
    use_cache: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_retries: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timeout_ms: Option<u64>,
}

impl RequestDescriptor {
    pub fn builder(method: HttpMethod, endpoint: impl Into<String>) -> RequestDescriptorBuilder {
        RequestDescriptorBuilder::new(method, endpoint)
    }

    /// Cacheable GET with default options
    pub fn get(endpoint: impl Into<String>) -> EngineResult<Self> {
        Self::builder(HttpMethod::Get, endpoint).build()
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn use_cache(&self) -> bool {
        self.use_cache
    }

    pub fn max_retries(&self) -> Option<u32> {
        self.max_retries
    }

    pub fn timeout_ms(&self) -> Option<u64> {
        self.timeout_ms
    }

    /// Whether the response may be served from or written to the cache
    pub fn is_cacheable(&self) -> bool {
        self.use_cache && !self.method.is_mutating()
    }

    /// Copy with one header replaced
    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Copy with the body replaced
    #[must_use]
    pub fn with_body(mut self, body: Option<Value>) -> Self {
        self.body = body;
        self
    }

    /// Builder pre-filled with this request's fields
    pub fn to_builder(&self) -> RequestDescriptorBuilder {
        RequestDescriptorBuilder { inner: self.clone() }
    }

    /// Identity used for cache keys: `METHOD:endpoint:canonicalBody`
    ///
    /// The canonical body is compact JSON with object keys sorted, so two
    /// bodies that differ only in key order share a key.
    pub fn cache_identity(&self) -> String {
        let body = self.body.as_ref().map(canonical_json).unwrap_or_default();
        format!("{}:{}:{}", self.method, self.endpoint, body)
    }
}

/// Builder for [`RequestDescriptor`]
#[derive(Debug, Clone)]
pub struct RequestDescriptorBuilder {
    inner: RequestDescriptor,
}

impl RequestDescriptorBuilder {
    fn new(method: HttpMethod, endpoint: impl Into<String>) -> Self {
        Self {
            inner: RequestDescriptor {
                method,
                endpoint: endpoint.into(),
                headers: Headers::new(),
                body: None,
                use_cache: !method.is_mutating(),
                max_retries: None,
                timeout_ms: None,
            },
        }
    }

    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.inner.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.inner.body = Some(body);
        self
    }

    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.inner.use_cache = use_cache;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.inner.max_retries = Some(max_retries);
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.inner.timeout_ms = Some(timeout_ms);
        self
    }

    /// Validate and produce the descriptor
    pub fn build(self) -> EngineResult<RequestDescriptor> {
        if self.inner.endpoint.trim().is_empty() {
            return Err(EngineError::config("endpoint must not be empty"));
        }
        if self.inner.timeout_ms == Some(0) {
            return Err(EngineError::config("timeoutMs must be greater than zero"));
        }
        Ok(self.inner)
    }
}

/// Compact JSON with object keys sorted at every depth
pub fn canonical_json(value: &Value) -> String {
    fn sorted(value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let ordered: BTreeMap<&String, Value> =
                    map.iter().map(|(k, v)| (k, sorted(v))).collect();
                Value::Object(ordered.into_iter().map(|(k, v)| (k.clone(), v)).collect())
            }
            Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
            other => other.clone(),
        }
    }

    sorted(value).to_string()
}
