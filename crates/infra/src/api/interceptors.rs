//! Request and response interceptors
//!
//! Interceptors run in registration order. Each sees the current value and
//! may return a replacement (`Ok(Some(_))`) or leave it unchanged
//! (`Ok(None)`). An interceptor that returns `Err` is logged and skipped; the
//! rest of the chain still runs.
//!
//! Closures implement both traits:
//!
//! ```
//! use courier_domain::RequestDescriptor;
//! use courier_infra::api::{InterceptorChain, InterceptorError};
//!
//! let chain = InterceptorChain::new();
//! chain.add_request(|req: &RequestDescriptor| -> Result<Option<RequestDescriptor>, InterceptorError> {
//!     Ok(Some(req.clone().with_header("x-client", "courier")))
//! });
//!
//! let out = chain.run_request(RequestDescriptor::get("/profile").unwrap());
//! assert_eq!(out.headers().get("x-client"), Some("courier"));
//! ```

use std::sync::Arc;

use courier_domain::{ApiResponse, RequestDescriptor};
use parking_lot::RwLock;
use thiserror::Error;
use tracing::warn;

/// Failure reported by an interceptor
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct InterceptorError(pub String);

impl InterceptorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub trait RequestInterceptor: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn intercept(
        &self,
        request: &RequestDescriptor,
    ) -> Result<Option<RequestDescriptor>, InterceptorError>;
}

pub trait ResponseInterceptor: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn intercept(&self, response: &ApiResponse) -> Result<Option<ApiResponse>, InterceptorError>;
}

impl<F> RequestInterceptor for F
where
    F: Fn(&RequestDescriptor) -> Result<Option<RequestDescriptor>, InterceptorError> + Send + Sync,
{
    fn intercept(
        &self,
        request: &RequestDescriptor,
    ) -> Result<Option<RequestDescriptor>, InterceptorError> {
        self(request)
    }
}

impl<F> ResponseInterceptor for F
where
    F: Fn(&ApiResponse) -> Result<Option<ApiResponse>, InterceptorError> + Send + Sync,
{
    fn intercept(&self, response: &ApiResponse) -> Result<Option<ApiResponse>, InterceptorError> {
        self(response)
    }
}

/// Ordered request and response hooks
#[derive(Default)]
pub struct InterceptorChain {
    request: RwLock<Vec<Arc<dyn RequestInterceptor>>>,
    response: RwLock<Vec<Arc<dyn ResponseInterceptor>>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_request(&self, interceptor: impl RequestInterceptor + 'static) {
        self.request.write().push(Arc::new(interceptor));
    }

    pub fn add_response(&self, interceptor: impl ResponseInterceptor + 'static) {
        self.response.write().push(Arc::new(interceptor));
    }

    /// Pass `request` through every request interceptor
    pub fn run_request(&self, request: RequestDescriptor) -> RequestDescriptor {
        // Snapshot so user code never runs under the lock
        let interceptors = self.request.read().clone();

        interceptors.iter().fold(request, |current, interceptor| {
            match interceptor.intercept(&current) {
                Ok(Some(replacement)) => replacement,
                Ok(None) => current,
                Err(err) => {
                    warn!(interceptor = interceptor.name(), error = %err, "request interceptor failed, skipping");
                    current
                }
            }
        })
    }

    /// Pass `response` through every response interceptor
    pub fn run_response(&self, response: ApiResponse) -> ApiResponse {
        let interceptors = self.response.read().clone();

        interceptors.iter().fold(response, |current, interceptor| {
            match interceptor.intercept(&current) {
                Ok(Some(replacement)) => replacement,
                Ok(None) => current,
                Err(err) => {
                    warn!(interceptor = interceptor.name(), error = %err, "response interceptor failed, skipping");
                    current
                }
            }
        })
    }

    pub fn request_len(&self) -> usize {
        self.request.read().len()
    }

    pub fn response_len(&self) -> usize {
        self.response.read().len()
    }
}

impl std::fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("request", &self.request_len())
            .field("response", &self.response_len())
            .finish()
    }
}
