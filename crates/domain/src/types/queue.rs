//! Offline queue records
//!
//! These are the on-disk shapes of the offline queue file, a JSON array of
//! `{id, actionKind, payload, enqueuedAt}` objects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::request::{HttpMethod, RequestDescriptor};
use super::response::ApiResponse;
use crate::errors::EngineResult;
use crate::impl_wire_name_conversions;

/// Mutating operations that can be deferred while offline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Create,
    Replace,
    Update,
    Delete,
}

impl_wire_name_conversions!(ActionKind {
    Create => "create",
    Replace => "replace",
    Update => "update",
    Delete => "delete",
});

impl ActionKind {
    pub fn method(&self) -> HttpMethod {
        match self {
            Self::Create => HttpMethod::Post,
            Self::Replace => HttpMethod::Put,
            Self::Update => HttpMethod::Patch,
            Self::Delete => HttpMethod::Delete,
        }
    }

    /// Inverse of [`method`](Self::method); `None` for read-only verbs
    pub fn from_method(method: HttpMethod) -> Option<Self> {
        match method {
            HttpMethod::Post => Some(Self::Create),
            HttpMethod::Put => Some(Self::Replace),
            HttpMethod::Patch => Some(Self::Update),
            HttpMethod::Delete => Some(Self::Delete),
            HttpMethod::Get | HttpMethod::Head | HttpMethod::Options => None,
        }
    }
}

/// Data needed to rebuild the request at replay time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPayload {
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl ActionPayload {
    pub fn new(endpoint: impl Into<String>, body: Option<Value>) -> Self {
        Self { endpoint: endpoint.into(), body }
    }
}

/// A deferred mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineQueueItem {
    /// `<millis>-<hex>`, unique per enqueue
    pub id: String,
    pub action_kind: ActionKind,
    pub payload: ActionPayload,
    pub enqueued_at: DateTime<Utc>,
}

impl OfflineQueueItem {
    /// Request that replays this item; never cached
    pub fn to_request(&self) -> EngineResult<RequestDescriptor> {
        let mut builder =
            RequestDescriptor::builder(self.action_kind.method(), self.payload.endpoint.clone())
                .use_cache(false);
        if let Some(body) = &self.payload.body {
            builder = builder.body(body.clone());
        }
        builder.build()
    }
}

/// Outcome of one drain pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrainReport {
    /// Items replayed and removed
    pub succeeded: usize,
    /// Items whose replay failed (at most one, the pass stops there)
    pub failed: usize,
    /// Items still queued after the pass
    pub remaining: usize,
    /// True when another drain was already running and this one did nothing
    pub skipped: bool,
}

impl DrainReport {
    pub fn skipped(remaining: usize) -> Self {
        Self { remaining, skipped: true, ..Self::default() }
    }
}

/// Result of a mutating call made through the client facade
#[derive(Debug, Clone, PartialEq)]
pub enum PerformOutcome {
    /// Sent and acknowledged by the server
    Completed(ApiResponse),
    /// Deferred to the offline queue
    Queued(OfflineQueueItem),
}

impl PerformOutcome {
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued(_))
    }
}
