//! Offline support
//!
//! - [`OfflineQueue`]: durable FIFO of mutating actions made while offline
//! - [`ConnectivityMonitor`]: online/offline state with transition events
//! - [`ReplayWorker`]: drains the queue whenever connectivity returns
//!
//! The worker tracks its join handle and stops through an explicit
//! cancellation token.

mod connectivity;
mod errors;
mod offline_queue;
mod persistence;
mod replay_worker;

pub use connectivity::ConnectivityMonitor;
pub use errors::{QueueError, QueueResult};
pub use offline_queue::{ActionReplayer, OfflineQueue};
pub use persistence::{QueueFile, QueueRecord};
pub use replay_worker::{ReplayWorker, ReplayWorkerConfig};
