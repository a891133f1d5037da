//! Token resolution across storage backends

use std::path::Path;
use std::sync::Arc;

use courier_common::time::{Clock, SystemClock};
use courier_domain::{EngineError, EngineResult};
use tracing::{debug, info, warn};

use super::store::{CookieTokenStore, FileTokenStore, MemoryTokenStore, TokenBackend, TokenStore};
use super::token::AuthToken;

/// Resolves the current credential from an ordered list of stores
///
/// The first store holding a token wins. A token that fails validation is
/// treated as absent and purged from every store, not just the one it came
/// from.
pub struct TokenProvider {
    stores: Vec<Arc<dyn TokenStore>>,
    clock: Arc<dyn Clock>,
}

impl TokenProvider {
    /// Provider over `stores`, searched in the given order
    pub fn new(stores: Vec<Arc<dyn TokenStore>>) -> Self {
        Self::with_clock(stores, Arc::new(SystemClock))
    }

    pub fn with_clock(stores: Vec<Arc<dyn TokenStore>>, clock: Arc<dyn Clock>) -> Self {
        Self { stores, clock }
    }

    /// File store at `token_path`, then an in-memory store, then an empty
    /// cookie jar
    pub fn standard(token_path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> Self {
        let stores: Vec<Arc<dyn TokenStore>> = vec![
            Arc::new(FileTokenStore::new(token_path.as_ref())) as Arc<dyn TokenStore>,
            Arc::new(MemoryTokenStore::new()),
            Arc::new(CookieTokenStore::default()),
        ];
        Self::with_clock(stores, clock)
    }

    /// First valid token, or `None`
    ///
    /// A store that fails to read is skipped. An invalid or expired token
    /// clears every store.
    pub fn get_token(&self) -> Option<AuthToken> {
        for store in &self.stores {
            let backend = store.backend();
            let raw = match store.read() {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(err) => {
                    warn!(%backend, error = %err, "token store read failed, skipping");
                    continue;
                }
            };

            return match AuthToken::parse(&raw, self.clock.as_ref()) {
                Ok(token) => {
                    debug!(%backend, "resolved auth token");
                    Some(token)
                }
                Err(err) => {
                    warn!(%backend, error = %err, "stored token rejected, purging all backends");
                    self.clear_all();
                    None
                }
            };
        }
        None
    }

    /// Validate `token` and write it to `backend`
    ///
    /// Invalid tokens are rejected without touching what is already stored.
    pub fn set_token(&self, token: &str, backend: TokenBackend) -> EngineResult<AuthToken> {
        let parsed = AuthToken::parse(token, self.clock.as_ref())?;

        let store = self.store(backend).ok_or_else(|| {
            EngineError::config(format!("no {backend} token store is configured"))
        })?;
        store
            .write(parsed.raw())
            .map_err(|e| EngineError::storage(format!("failed to write {backend} token: {e}")))?;

        info!(%backend, "auth token stored");
        Ok(parsed)
    }

    /// Remove the token from every store
    ///
    /// Failures are logged; the remaining stores are still cleared.
    pub fn clear_all(&self) {
        for store in &self.stores {
            if let Err(err) = store.clear() {
                warn!(backend = %store.backend(), error = %err, "failed to clear token store");
            }
        }
        info!("auth tokens cleared from all backends");
    }

    pub fn store(&self, backend: TokenBackend) -> Option<&Arc<dyn TokenStore>> {
        self.stores.iter().find(|store| store.backend() == backend)
    }

    pub fn backends(&self) -> Vec<TokenBackend> {
        self.stores.iter().map(|s| s.backend()).collect()
    }
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider").field("backends", &self.backends()).finish()
    }
}
