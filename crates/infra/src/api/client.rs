//! Client facade
//!
//! Reads go straight to the [`RequestExecutor`]. Mutating actions are sent
//! when online and parked in the [`OfflineQueue`] when the network is
//! unavailable.

use std::sync::Arc;

use courier_domain::{
    ActionKind, ActionPayload, ApiResponse, DrainReport, EngineConfig, EngineError, EngineResult,
    PerformOutcome, RequestDescriptor,
};
use tracing::{info, instrument, warn};

use super::executor::RequestExecutor;
use crate::sync::{
    ActionReplayer, ConnectivityMonitor, OfflineQueue, ReplayWorker, ReplayWorkerConfig,
};

/// Request engine plus offline queue behind one handle
#[derive(Debug, Clone)]
pub struct ApiClient {
    executor: Arc<RequestExecutor>,
    queue: Arc<OfflineQueue>,
}

impl ApiClient {
    pub fn new(executor: Arc<RequestExecutor>, queue: Arc<OfflineQueue>) -> Self {
        Self { executor, queue }
    }

    /// Build a client with production defaults for `config`
    ///
    /// Opens the offline queue at `config.queue_path`.
    pub async fn open(config: EngineConfig) -> EngineResult<Self> {
        let queue = Arc::new(OfflineQueue::open(config.queue_path.clone()).await?);
        let executor = Arc::new(RequestExecutor::builder(config).build()?);
        Ok(Self::new(executor, queue))
    }

    /// Cacheable GET
    pub async fn get(&self, endpoint: &str) -> EngineResult<ApiResponse> {
        self.executor.execute(RequestDescriptor::get(endpoint)?).await
    }

    pub async fn execute(&self, request: RequestDescriptor) -> EngineResult<ApiResponse> {
        self.executor.execute(request).await
    }

    /// Send a mutating action, or queue it when the network is unavailable
    ///
    /// Only `NetworkUnavailable` diverts to the queue; every other failure is
    /// returned to the caller. That includes `ResponseInterrupted`, where the
    /// server may already have applied the action.
    #[instrument(skip(self, payload), fields(kind = %kind, endpoint = %payload.endpoint))]
    pub async fn perform(
        &self,
        kind: ActionKind,
        payload: ActionPayload,
    ) -> EngineResult<PerformOutcome> {
        let mut builder =
            RequestDescriptor::builder(kind.method(), payload.endpoint.clone()).use_cache(false);
        if let Some(body) = &payload.body {
            builder = builder.body(body.clone());
        }
        let request = builder.build()?;

        if !self.connectivity().is_online() {
            info!("offline, queueing action");
            return self.queue.enqueue(kind, payload).await.map(PerformOutcome::Queued);
        }

        match self.executor.execute(request).await {
            Ok(response) => Ok(PerformOutcome::Completed(response)),
            Err(EngineError::NetworkUnavailable(reason)) => {
                warn!(%reason, "network unavailable, queueing action");
                self.queue.enqueue(kind, payload).await.map(PerformOutcome::Queued)
            }
            Err(err) => Err(err),
        }
    }

    /// Drain the offline queue now
    pub async fn replay_pending(&self) -> EngineResult<DrainReport> {
        self.queue.drain(self.executor.as_ref()).await
    }

    /// Worker that replays the queue on every reconnect
    pub fn replay_worker(&self, config: ReplayWorkerConfig) -> ReplayWorker {
        ReplayWorker::new(
            Arc::clone(&self.queue),
            Arc::clone(&self.executor) as Arc<dyn ActionReplayer>,
            self.connectivity().clone(),
            config,
        )
    }

    pub fn executor(&self) -> &Arc<RequestExecutor> {
        &self.executor
    }

    pub fn queue(&self) -> &Arc<OfflineQueue> {
        &self.queue
    }

    pub fn connectivity(&self) -> &ConnectivityMonitor {
        self.executor.connectivity()
    }

    /// Cancel in-flight requests and drop cached responses
    ///
    /// Queued actions stay on disk.
    pub fn close(&self) {
        self.executor.close();
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use courier_domain::HttpMethod;
    use parking_lot::Mutex;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::auth::{MemoryTokenStore, TokenProvider, TokenStore};
    use crate::http::{Transport, TransportError, TransportRequest, TransportResponse};

    struct FlakyTransport {
        failures: Mutex<u32>,
        failure: TransportError,
        seen: Mutex<Vec<(HttpMethod, String)>>,
    }

    #[async_trait]
    impl Transport for FlakyTransport {
        async fn send(
            &self,
            request: TransportRequest,
        ) -> Result<TransportResponse, TransportError> {
            self.seen.lock().push((request.method, request.url.clone()));
            let mut failures = self.failures.lock();
            if *failures > 0 {
                *failures -= 1;
                return Err(self.failure.clone());
            }
            Ok(TransportResponse::new(201, r#"{"success":true,"data":{"id":9}}"#))
        }
    }

    async fn client(dir: &TempDir, connect_failures: u32) -> (ApiClient, Arc<FlakyTransport>) {
        client_failing_with(
            dir,
            connect_failures,
            TransportError::Connect("connection refused".into()),
        )
        .await
    }

    async fn client_failing_with(
        dir: &TempDir,
        failures: u32,
        failure: TransportError,
    ) -> (ApiClient, Arc<FlakyTransport>) {
        let transport = Arc::new(FlakyTransport {
            failures: Mutex::new(failures),
            failure,
            seen: Mutex::default(),
        });
        let config = EngineConfig {
            max_retries: 1,
            queue_path: dir.path().join("queue.json"),
            ..EngineConfig::new("https://api.test")
        };
        let executor = RequestExecutor::builder(config.clone())
            .transport(transport.clone())
            .token_provider(Arc::new(TokenProvider::new(vec![
                Arc::new(MemoryTokenStore::new()) as Arc<dyn TokenStore>
            ])))
            .build()
            .unwrap();
        let queue = OfflineQueue::open(config.queue_path).await.unwrap();
        (ApiClient::new(Arc::new(executor), Arc::new(queue)), transport)
    }

    #[tokio::test]
    async fn perform_sends_when_online() {
        let dir = TempDir::new().unwrap();
        let (client, transport) = client(&dir, 0).await;

        let outcome = client
            .perform(ActionKind::Create, ActionPayload::new("/notes", Some(json!({"t": 1}))))
            .await
            .unwrap();

        assert!(matches!(outcome, PerformOutcome::Completed(ref r) if r.data == json!({"id": 9})));
        assert_eq!(*transport.seen.lock(), vec![(HttpMethod::Post, "https://api.test/notes".into())]);
        assert!(client.queue().is_empty().await);
    }

    #[tokio::test]
    async fn perform_queues_when_offline() {
        let dir = TempDir::new().unwrap();
        let (client, transport) = client(&dir, 0).await;
        client.connectivity().set_online(false);

        let outcome =
            client.perform(ActionKind::Delete, ActionPayload::new("/notes/3", None)).await.unwrap();

        assert!(outcome.is_queued());
        assert!(transport.seen.lock().is_empty());
        assert_eq!(client.queue().len().await, 1);
    }

    #[tokio::test]
    async fn perform_queues_on_network_failure_and_replays_later() {
        let dir = TempDir::new().unwrap();
        let (client, transport) = client(&dir, 1).await;

        let outcome =
            client.perform(ActionKind::Update, ActionPayload::new("/notes/3", None)).await.unwrap();
        assert!(outcome.is_queued());

        let report = client.replay_pending().await.unwrap();
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.remaining, 0);
        assert_eq!(transport.seen.lock().len(), 2);
    }

    #[tokio::test]
    async fn perform_does_not_queue_after_the_request_may_have_been_sent() {
        let dir = TempDir::new().unwrap();
        let (client, transport) = client_failing_with(
            &dir,
            1,
            TransportError::Other("error decoding response body".into()),
        )
        .await;

        let err = client
            .perform(ActionKind::Create, ActionPayload::new("/payments", Some(json!({"amount": 5}))))
            .await;

        assert!(matches!(err, Err(EngineError::ResponseInterrupted(_))), "got {err:?}");
        assert!(client.queue().is_empty().await);
        assert_eq!(transport.seen.lock().len(), 1);
    }

    #[tokio::test]
    async fn perform_rejects_invalid_payload_without_queueing() {
        let dir = TempDir::new().unwrap();
        let (client, _transport) = client(&dir, 0).await;
        client.connectivity().set_online(false);

        let err = client.perform(ActionKind::Create, ActionPayload::new("", None)).await;

        assert!(matches!(err, Err(EngineError::Config(_))));
        assert!(client.queue().is_empty().await);
    }
}
