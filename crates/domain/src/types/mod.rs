//! Domain types
//!
//! Request descriptions, parsed responses and offline queue records.

pub mod queue;
pub mod request;
pub mod response;

pub use queue::{ActionKind, ActionPayload, DrainReport, OfflineQueueItem, PerformOutcome};
pub use request::{canonical_json, Headers, HttpMethod, RequestDescriptor, RequestDescriptorBuilder};
pub use response::{ApiResponse, ResponseBody, ResponseEnvelope};
