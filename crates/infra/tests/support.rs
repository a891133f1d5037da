//! Shared fixtures for the infra integration tests

use std::sync::Arc;

use courier_common::resilience::ExponentialBackoff;
use courier_common::time::{Clock, MockClock};
use courier_domain::EngineConfig;
use courier_infra::api::{RequestExecutor, RetryPolicy};
use courier_infra::auth::{FileTokenStore, MemoryTokenStore, TokenProvider, TokenStore};
use courier_infra::http::HttpTransport;
use std::time::Duration;
use tempfile::TempDir;

pub const VALID_TOKEN: &str = "integration-token-0123456789";

/// Executor wired to a mock server, a mock clock and temp-dir token storage
pub struct Harness {
    pub executor: RequestExecutor,
    pub clock: MockClock,
    pub tokens: Arc<TokenProvider>,
    pub dir: TempDir,
}

pub fn config_for(server_uri: &str, dir: &TempDir) -> EngineConfig {
    EngineConfig {
        retry_base_delay_ms: 1,
        retry_max_delay_ms: 5,
        retry_jitter_factor: 0.0,
        queue_path: dir.path().join("queue.json"),
        token_path: dir.path().join("token"),
        ..EngineConfig::new(server_uri)
    }
}

pub fn harness(server_uri: &str) -> Harness {
    harness_with(server_uri, |config| config)
}

pub fn harness_with(server_uri: &str, tweak: impl FnOnce(EngineConfig) -> EngineConfig) -> Harness {
    let dir = TempDir::new().unwrap();
    let config = tweak(config_for(server_uri, &dir));
    let clock = MockClock::new();
    let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());

    let tokens = Arc::new(TokenProvider::with_clock(
        vec![
            Arc::new(FileTokenStore::new(&config.token_path)) as Arc<dyn TokenStore>,
            Arc::new(MemoryTokenStore::new()) as Arc<dyn TokenStore>,
        ],
        Arc::clone(&shared_clock),
    ));

    let retry = RetryPolicy::new(
        ExponentialBackoff::new(Duration::from_millis(1), Duration::from_millis(5))
            .unwrap()
            .with_jitter_factor(0.0),
    );

    let executor = RequestExecutor::builder(config.clone())
        .transport(Arc::new(HttpTransport::builder().timeout(config.timeout()).build().unwrap()))
        .token_provider(Arc::clone(&tokens))
        .clock(shared_clock)
        .retry_policy(retry)
        .build()
        .unwrap();

    Harness { executor, clock, tokens, dir }
}
