//! Request executor
//!
//! Turns a [`RequestDescriptor`] into an [`ApiResponse`]:
//!
//! 1. cacheable reads are answered from the [`ResponseCache`] when possible
//! 2. offline requests fail fast with `NetworkUnavailable`
//! 3. request interceptors run, then the bearer token is attached
//! 4. the transport is called under a deadline and two cancellation sources
//!    (the caller's token and the executor-wide shutdown token)
//! 5. retryable failures back off and try again within the attempt budget
//! 6. successful responses pass through response interceptors and are cached
//!
//! A 401 clears every stored token and the whole cache before surfacing. A
//! response that was in flight across such a purge is returned but not cached.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use courier_common::time::{Clock, SystemClock};
use courier_domain::constants::AUTHORIZATION_HEADER;
use courier_domain::{
    ApiResponse, EngineConfig, EngineError, EngineResult, OfflineQueueItem, RequestDescriptor,
    ResponseBody,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::cache::{CacheKey, ResponseCache};
use super::errors::{error_from_envelope, error_from_status};
use super::interceptors::InterceptorChain;
use super::retry::RetryPolicy;
use crate::auth::TokenProvider;
use crate::http::{HttpTransport, Transport, TransportError, TransportRequest, TransportResponse};
use crate::sync::{ActionReplayer, ConnectivityMonitor};

/// Executes requests with caching, retries, authentication and cancellation
pub struct RequestExecutor {
    config: EngineConfig,
    transport: Arc<dyn Transport>,
    tokens: Arc<TokenProvider>,
    cache: ResponseCache,
    /// Bumped on every purge; a write is kept only if no purge happened since
    /// its request started
    cache_generation: AtomicU64,
    retry: RetryPolicy,
    interceptors: InterceptorChain,
    connectivity: ConnectivityMonitor,
    shutdown: CancellationToken,
}

impl RequestExecutor {
    pub fn builder(config: EngineConfig) -> RequestExecutorBuilder {
        RequestExecutorBuilder::new(config)
    }

    /// Execute without a caller cancellation token
    pub async fn execute(&self, request: RequestDescriptor) -> EngineResult<ApiResponse> {
        self.execute_with_cancel(request, &CancellationToken::new()).await
    }

    /// Execute `request`, aborting as soon as `cancel` fires
    ///
    /// Cancellation yields `Cancelled`, is never retried and never writes the
    /// cache.
    #[instrument(
        skip(self, request, cancel),
        fields(method = %request.method(), endpoint = %request.endpoint())
    )]
    pub async fn execute_with_cancel(
        &self,
        request: RequestDescriptor,
        cancel: &CancellationToken,
    ) -> EngineResult<ApiResponse> {
        if self.shutdown.is_cancelled() || cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let cache_key = (self.config.enable_cache && request.is_cacheable())
            .then(|| CacheKey::for_request(&request));

        if let Some(key) = &cache_key {
            if let Some(cached) = self.cache.get(key) {
                debug!("served from cache");
                return Ok(cached);
            }
        }

        if !self.connectivity.is_online() {
            return Err(EngineError::network("client is offline"));
        }

        let generation = self.cache_generation.load(Ordering::SeqCst);
        let request = self.authorize(self.interceptors.run_request(request)).await?;
        let timeout = self.effective_timeout(&request);
        let max_retries = request.max_retries().unwrap_or(self.config.max_retries);

        let mut attempt: u32 = 0;
        loop {
            let error = match self.attempt(&request, timeout, cancel).await {
                Ok(response) => {
                    let response = self.interceptors.run_response(response);
                    if let Some(key) = cache_key {
                        self.store(key, &response, generation);
                    }
                    return Ok(response);
                }
                Err(error) => error,
            };

            if error.is_unauthorized() {
                warn!("received 401, clearing credentials and cache");
                self.purge_cache();
                if let Err(err) = self.clear_tokens().await {
                    warn!(error = %err, "failed to clear stored tokens");
                }
            }

            if !self.retry.should_retry(attempt, max_retries, &error) {
                if attempt > 0 {
                    info!(attempts = attempt + 1, error = %error, "giving up after retries");
                }
                return Err(error);
            }

            let delay = self.retry.backoff_delay(attempt);
            let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
            warn!(attempt = attempt + 1, delay_ms, error = %error, "retrying request");
            tokio::select! {
                _ = cancel.cancelled() => return Err(EngineError::Cancelled),
                _ = self.shutdown.cancelled() => return Err(EngineError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }

    /// Cancel in-flight requests, reject new ones and drop the cache
    pub fn close(&self) {
        info!("closing request executor");
        self.shutdown.cancel();
        self.purge_cache();
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn token_provider(&self) -> &Arc<TokenProvider> {
        &self.tokens
    }

    pub fn interceptors(&self) -> &InterceptorChain {
        &self.interceptors
    }

    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.connectivity
    }

    /// One transport call, mapped into the engine taxonomy
    async fn attempt(
        &self,
        request: &RequestDescriptor,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> EngineResult<ApiResponse> {
        let outbound = TransportRequest {
            method: request.method(),
            url: self.config.url_for(request.endpoint()),
            headers: request.headers().clone(),
            body: request.body().cloned(),
        };

        // Dropping the losing branch drops the transport future, which aborts
        // the underlying connection.
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(EngineError::Cancelled),
            _ = self.shutdown.cancelled() => return Err(EngineError::Cancelled),
            result = tokio::time::timeout(timeout, self.transport.send(outbound)) => result,
        };

        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        match outcome {
            Err(_elapsed) => Err(EngineError::Timeout { timeout_ms }),
            Ok(Err(TransportError::Timeout(_))) => Err(EngineError::Timeout { timeout_ms }),
            Ok(Err(TransportError::InvalidRequest(msg))) => Err(EngineError::config(msg)),
            Ok(Err(err @ TransportError::Connect(_))) => Err(EngineError::network(err.to_string())),
            Ok(Err(err @ TransportError::Other(_))) => {
                Err(EngineError::ResponseInterrupted(err.to_string()))
            }
            Ok(Ok(response)) => Self::interpret(response),
        }
    }

    fn interpret(response: TransportResponse) -> EngineResult<ApiResponse> {
        let status = response.status;
        if !response.is_success() {
            return Err(error_from_status(status, &response.body));
        }

        match ResponseBody::parse(&response.body) {
            ResponseBody::Envelope(envelope) if !envelope.success => {
                Err(error_from_envelope(status, envelope.message.as_deref(), envelope.code))
            }
            ResponseBody::Envelope(envelope) => Ok(ApiResponse {
                status,
                data: envelope.data,
                message: envelope.message,
                code: envelope.code,
            }),
            ResponseBody::Raw(data) => Ok(ApiResponse::new(status, data)),
        }
    }

    /// Token stores may touch the filesystem, so they run on the blocking pool
    async fn authorize(&self, request: RequestDescriptor) -> EngineResult<RequestDescriptor> {
        if request.headers().contains(AUTHORIZATION_HEADER) {
            return Ok(request);
        }
        let tokens = Arc::clone(&self.tokens);
        let token = tokio::task::spawn_blocking(move || tokens.get_token())
            .await
            .map_err(|e| EngineError::Internal(format!("spawn_blocking failed: {e}")))?;
        Ok(match token {
            Some(token) => request.with_header(AUTHORIZATION_HEADER, token.bearer()),
            None => request,
        })
    }

    async fn clear_tokens(&self) -> EngineResult<()> {
        let tokens = Arc::clone(&self.tokens);
        tokio::task::spawn_blocking(move || tokens.clear_all())
            .await
            .map_err(|e| EngineError::Internal(format!("spawn_blocking failed: {e}")))
    }

    fn purge_cache(&self) {
        self.cache_generation.fetch_add(1, Ordering::SeqCst);
        self.cache.clear();
    }

    /// Cache `response` unless a purge ran after `generation` was read
    fn store(&self, key: CacheKey, response: &ApiResponse, generation: u64) {
        if self.cache_generation.load(Ordering::SeqCst) != generation {
            debug!("cache purged while request was in flight, not caching");
            return;
        }
        self.cache.set(key.clone(), response.clone(), self.config.cache_ttl());
        // A purge between the check and the write may have missed this entry
        if self.cache_generation.load(Ordering::SeqCst) != generation {
            self.cache.delete(&key);
        }
    }

    fn effective_timeout(&self, request: &RequestDescriptor) -> Duration {
        let configured = self.config.timeout_ms;
        let requested = request.timeout_ms().unwrap_or(configured);
        Duration::from_millis(requested.min(configured))
    }
}

#[async_trait]
impl ActionReplayer for RequestExecutor {
    async fn replay(&self, item: &OfflineQueueItem) -> EngineResult<ApiResponse> {
        self.execute(item.to_request()?).await
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("api_base", &self.config.api_base)
            .field("cache", &self.cache)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Builder for [`RequestExecutor`]
///
/// Every collaborator has a production default derived from the config.
pub struct RequestExecutorBuilder {
    config: EngineConfig,
    transport: Option<Arc<dyn Transport>>,
    tokens: Option<Arc<TokenProvider>>,
    connectivity: Option<ConnectivityMonitor>,
    clock: Option<Arc<dyn Clock>>,
    retry: Option<RetryPolicy>,
}

impl RequestExecutorBuilder {
    fn new(config: EngineConfig) -> Self {
        Self { config, transport: None, tokens: None, connectivity: None, clock: None, retry: None }
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn token_provider(mut self, tokens: Arc<TokenProvider>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn connectivity(mut self, connectivity: ConnectivityMonitor) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    /// Clock used for cache TTLs and, by default, token expiry
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn build(self) -> EngineResult<RequestExecutor> {
        self.config.validate()?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::builder().timeout(self.config.timeout()).build()?),
        };
        let tokens = self.tokens.unwrap_or_else(|| {
            Arc::new(TokenProvider::standard(&self.config.token_path, Arc::clone(&clock)))
        });
        let retry = match self.retry {
            Some(retry) => retry,
            None => RetryPolicy::from_config(&self.config)?,
        };

        Ok(RequestExecutor {
            cache: ResponseCache::with_clock(self.config.max_cache_entries, clock),
            cache_generation: AtomicU64::new(0),
            transport,
            tokens,
            retry,
            interceptors: InterceptorChain::new(),
            connectivity: self.connectivity.unwrap_or_default(),
            shutdown: CancellationToken::new(),
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    use courier_common::resilience::ExponentialBackoff;
    use courier_common::time::MockClock;
    use parking_lot::Mutex;
    use serde_json::json;
    use tokio::sync::Notify;

    use super::*;
    use crate::api::InterceptorError;
    use crate::auth::{MemoryTokenStore, TokenBackend, TokenStore};

    /// Transport that replays scripted outcomes and records requests
    #[derive(Default)]
    struct ScriptedTransport {
        script: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
        seen: Mutex<Vec<TransportRequest>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<TransportResponse, TransportError>>) -> Arc<Self> {
            Arc::new(Self { script: Mutex::new(script.into()), seen: Mutex::default() })
        }

        fn calls(&self) -> usize {
            self.seen.lock().len()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(
            &self,
            request: TransportRequest,
        ) -> Result<TransportResponse, TransportError> {
            self.seen.lock().push(request);
            self.script
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(TransportResponse::new(200, "{}")))
        }
    }

    fn ok(body: &str) -> Result<TransportResponse, TransportError> {
        Ok(TransportResponse::new(200, body))
    }

    fn status(code: u16) -> Result<TransportResponse, TransportError> {
        Ok(TransportResponse::new(code, ""))
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::new(
            ExponentialBackoff::new(Duration::from_millis(1), Duration::from_millis(4))
                .unwrap()
                .with_jitter_factor(0.0),
        )
    }

    /// Holds authenticated `/a` requests until released; `/b` answers 401
    #[derive(Default)]
    struct GatedTransport {
        entered: Notify,
        release: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transport for GatedTransport {
        async fn send(
            &self,
            request: TransportRequest,
        ) -> Result<TransportResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if request.url.ends_with("/b") {
                return Ok(TransportResponse::new(401, ""));
            }
            if request.headers.contains("authorization") {
                self.entered.notify_one();
                self.release.notified().await;
                return Ok(TransportResponse::new(200, r#"{"secret":"old-user"}"#));
            }
            Ok(TransportResponse::new(200, r#"{"secret":null}"#))
        }
    }

    fn executor(transport: Arc<dyn Transport>) -> (RequestExecutor, MockClock) {
        let clock = MockClock::new();
        let tokens = Arc::new(TokenProvider::with_clock(
            vec![Arc::new(MemoryTokenStore::new()) as Arc<dyn TokenStore>],
            Arc::new(clock.clone()),
        ));
        let executor = RequestExecutor::builder(EngineConfig::new("https://api.test"))
            .transport(transport)
            .token_provider(tokens)
            .clock(Arc::new(clock.clone()))
            .retry_policy(fast_retry())
            .build()
            .unwrap();
        (executor, clock)
    }

    #[tokio::test]
    async fn cached_get_skips_transport() {
        let transport = ScriptedTransport::new(vec![ok(r#"{"success":true,"data":{"id":1}}"#)]);
        let (executor, _clock) = executor(transport.clone());

        let first = executor.execute(RequestDescriptor::get("/profile").unwrap()).await.unwrap();
        let second = executor.execute(RequestDescriptor::get("/profile").unwrap()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.data, json!({"id": 1}));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn expired_entry_is_refetched() {
        let transport = ScriptedTransport::new(vec![ok(r#"{"v":1}"#), ok(r#"{"v":2}"#)]);
        let (executor, clock) = executor(transport.clone());

        let first = executor.execute(RequestDescriptor::get("/feed").unwrap()).await.unwrap();
        clock.advance(executor.config().cache_ttl());
        let second = executor.execute(RequestDescriptor::get("/feed").unwrap()).await.unwrap();

        assert_eq!(first.data, json!({"v": 1}));
        assert_eq!(second.data, json!({"v": 2}));
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn mutating_requests_are_never_cached() {
        let transport = ScriptedTransport::new(vec![]);
        let (executor, _clock) = executor(transport.clone());
        let post = RequestDescriptor::builder(courier_domain::HttpMethod::Post, "/items")
            .use_cache(true)
            .body(json!({"n": 1}))
            .build()
            .unwrap();

        executor.execute(post.clone()).await.unwrap();
        executor.execute(post).await.unwrap();

        assert_eq!(transport.calls(), 2);
        assert!(executor.cache().is_empty());
    }

    #[tokio::test]
    async fn retries_exhaust_budget_and_surface_last_error() {
        let transport =
            ScriptedTransport::new(vec![status(503), status(503), status(503), ok("{}")]);
        let (executor, _clock) = executor(transport.clone());

        let err = executor.execute(RequestDescriptor::get("/flaky").unwrap()).await.unwrap_err();

        assert_eq!(transport.calls(), 3);
        assert!(matches!(err, EngineError::RequestFailed { status: 503, retriable: true, .. }));
    }

    #[tokio::test]
    async fn recovers_when_success_arrives_within_budget() {
        let transport = ScriptedTransport::new(vec![status(500), status(429), ok(r#"{"ok":1}"#)]);
        let (executor, _clock) = executor(transport.clone());

        let response = executor.execute(RequestDescriptor::get("/flaky").unwrap()).await.unwrap();

        assert_eq!(response.data, json!({"ok": 1}));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let transport = ScriptedTransport::new(vec![status(404)]);
        let (executor, _clock) = executor(transport.clone());

        let err = executor.execute(RequestDescriptor::get("/missing").unwrap()).await.unwrap_err();

        assert_eq!(transport.calls(), 1);
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn connection_failures_surface_as_network_unavailable() {
        let transport = ScriptedTransport::new(vec![
            Err(TransportError::Connect("refused".into())),
            Err(TransportError::Connect("refused".into())),
            Err(TransportError::Connect("refused".into())),
        ]);
        let (executor, _clock) = executor(transport.clone());

        let err = executor.execute(RequestDescriptor::get("/x").unwrap()).await.unwrap_err();

        assert!(matches!(err, EngineError::NetworkUnavailable(_)));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn unauthorized_clears_tokens_and_cache() {
        let transport = ScriptedTransport::new(vec![ok(r#"{"cached":true}"#), status(401)]);
        let (executor, _clock) = executor(transport.clone());
        executor
            .token_provider()
            .set_token("session-token-0123456789", TokenBackend::Session)
            .unwrap();

        executor.execute(RequestDescriptor::get("/a").unwrap()).await.unwrap();
        assert_eq!(executor.cache().len(), 1);

        let err = executor.execute(RequestDescriptor::get("/b").unwrap()).await.unwrap_err();

        assert!(err.is_unauthorized());
        assert!(executor.token_provider().get_token().is_none());
        assert!(executor.cache().is_empty());
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn bearer_token_is_attached_unless_already_set() {
        let transport = ScriptedTransport::new(vec![]);
        let (executor, _clock) = executor(transport.clone());
        executor
            .token_provider()
            .set_token("session-token-0123456789", TokenBackend::Session)
            .unwrap();

        executor.execute(RequestDescriptor::get("/a").unwrap()).await.unwrap();
        let explicit = RequestDescriptor::builder(courier_domain::HttpMethod::Get, "/b")
            .header("Authorization", "Bearer custom")
            .build()
            .unwrap();
        executor.execute(explicit).await.unwrap();

        let seen = transport.seen.lock();
        assert_eq!(seen[0].headers.get("authorization"), Some("Bearer session-token-0123456789"));
        assert_eq!(seen[1].headers.get("authorization"), Some("Bearer custom"));
        assert_eq!(seen[0].url, "https://api.test/a");
    }

    #[tokio::test]
    async fn failed_envelope_becomes_request_failed() {
        let transport = ScriptedTransport::new(vec![ok(
            r#"{"success":false,"message":"Email is invalid","code":"E_EMAIL"}"#,
        )]);
        let (executor, _clock) = executor(transport.clone());

        let err = executor.execute(RequestDescriptor::get("/signup").unwrap()).await.unwrap_err();

        assert_eq!(
            err,
            EngineError::RequestFailed {
                status: 200,
                message: "Email is invalid".into(),
                code: Some("E_EMAIL".into()),
                retriable: false,
            }
        );
        assert!(executor.cache().is_empty());
    }

    #[tokio::test]
    async fn failed_envelope_with_numeric_code_is_still_a_failure() {
        let transport = ScriptedTransport::new(vec![ok(
            r#"{"success":false,"message":"Email is invalid","code":422}"#,
        )]);
        let (executor, _clock) = executor(transport.clone());

        let err = executor.execute(RequestDescriptor::get("/signup").unwrap()).await.unwrap_err();

        assert_eq!(
            err,
            EngineError::RequestFailed {
                status: 200,
                message: "Email is invalid".into(),
                code: Some("422".into()),
                retriable: false,
            }
        );
        assert!(executor.cache().is_empty());
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn response_landing_after_unauthorized_purge_is_not_cached() {
        let transport = Arc::new(GatedTransport::default());
        let (executor, _clock) = executor(transport.clone());
        executor
            .token_provider()
            .set_token("session-token-0123456789", TokenBackend::Session)
            .unwrap();
        let executor = Arc::new(executor);

        let in_flight = tokio::spawn({
            let executor = Arc::clone(&executor);
            async move { executor.execute(RequestDescriptor::get("/a").unwrap()).await }
        });
        transport.entered.notified().await;

        let err = executor.execute(RequestDescriptor::get("/b").unwrap()).await.unwrap_err();
        assert!(err.is_unauthorized());
        transport.release.notify_one();

        let late = in_flight.await.unwrap().unwrap();
        assert_eq!(late.data, json!({"secret": "old-user"}));
        assert!(executor.cache().is_empty());

        let fresh = executor.execute(RequestDescriptor::get("/a").unwrap()).await.unwrap();
        assert_eq!(fresh.data, json!({"secret": null}));
        assert_eq!(transport.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failures_after_connect_surface_as_response_interrupted() {
        let interrupted = || -> Result<TransportResponse, TransportError> {
            Err(TransportError::Other("connection reset reading body".into()))
        };
        let transport = ScriptedTransport::new(vec![interrupted(), interrupted(), interrupted()]);
        let (executor, _clock) = executor(transport.clone());

        let err = executor.execute(RequestDescriptor::get("/x").unwrap()).await.unwrap_err();

        assert!(matches!(err, EngineError::ResponseInterrupted(_)), "got {err:?}");
        assert!(err.is_retryable());
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn empty_body_yields_null_data() {
        let transport = ScriptedTransport::new(vec![Ok(TransportResponse::new(204, ""))]);
        let (executor, _clock) = executor(transport);

        let response = executor.execute(RequestDescriptor::get("/noop").unwrap()).await.unwrap();
        assert_eq!(response.status, 204);
        assert_eq!(response.data, serde_json::Value::Null);
    }

    #[tokio::test]
    async fn offline_fails_fast_without_transport_call() {
        let transport = ScriptedTransport::new(vec![]);
        let (executor, _clock) = executor(transport.clone());
        executor.connectivity().set_online(false);

        let err = executor.execute(RequestDescriptor::get("/x").unwrap()).await.unwrap_err();

        assert!(matches!(err, EngineError::NetworkUnavailable(_)));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn interceptors_wrap_the_transport_call() {
        let transport = ScriptedTransport::new(vec![ok(r#"{"n":1}"#)]);
        let (executor, _clock) = executor(transport.clone());
        executor.interceptors().add_request(
            |req: &RequestDescriptor| -> Result<Option<RequestDescriptor>, InterceptorError> {
                Ok(Some(req.clone().with_header("x-trace", "t-1")))
            },
        );
        executor.interceptors().add_response(
            |resp: &ApiResponse| -> Result<Option<ApiResponse>, InterceptorError> {
                let mut next = resp.clone();
                next.message = Some("seen".into());
                Ok(Some(next))
            },
        );

        let response = executor.execute(RequestDescriptor::get("/x").unwrap()).await.unwrap();

        assert_eq!(response.message.as_deref(), Some("seen"));
        assert_eq!(transport.seen.lock()[0].headers.get("x-trace"), Some("t-1"));
        // The cached copy is the intercepted one
        let cached = executor.execute(RequestDescriptor::get("/x").unwrap()).await.unwrap();
        assert_eq!(cached.message.as_deref(), Some("seen"));
    }

    #[tokio::test]
    async fn closed_executor_rejects_requests() {
        let transport = ScriptedTransport::new(vec![]);
        let (executor, _clock) = executor(transport.clone());

        executor.close();

        let err = executor.execute(RequestDescriptor::get("/x").unwrap()).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn request_timeout_is_capped_by_config() {
        let transport = ScriptedTransport::new(vec![]);
        let (executor, _clock) = executor(transport);

        let long = RequestDescriptor::builder(courier_domain::HttpMethod::Get, "/x")
            .timeout_ms(120_000)
            .build()
            .unwrap();
        let short = RequestDescriptor::builder(courier_domain::HttpMethod::Get, "/x")
            .timeout_ms(250)
            .build()
            .unwrap();

        assert_eq!(executor.effective_timeout(&long), Duration::from_millis(30_000));
        assert_eq!(executor.effective_timeout(&short), Duration::from_millis(250));
    }
}
