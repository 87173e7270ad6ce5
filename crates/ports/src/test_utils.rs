//! Shared test doubles for port traits.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use domain::vendor::entity::{ApiRequest, ApiResponse};
use domain::vendor::error::GatewayError;

use crate::secondary::metrics_port::MetricsPort;
use crate::secondary::vendor_gateway::VendorGateway;

/// Metrics implementation that records nothing.
pub struct NoopMetrics;

impl MetricsPort for NoopMetrics {}

/// Gateway double that replays a scripted sequence of results and records
/// every request it saw.
///
/// Results are consumed in order; once the script runs dry every further
/// request gets `GatewayError::Unavailable`.
#[derive(Default)]
pub struct ScriptedGateway {
    script: Mutex<VecDeque<Result<ApiResponse, GatewayError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedGateway {
    pub fn new(script: Vec<Result<ApiResponse, GatewayError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request seen so far, in arrival order.
    pub fn seen(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

impl VendorGateway for ScriptedGateway {
    fn request<'a>(
        &'a self,
        request: ApiRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ApiResponse, GatewayError>> + Send + 'a>> {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(request);
        let next = self
            .script
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front()
            .unwrap_or(Err(GatewayError::Unavailable));
        Box::pin(async move { next })
    }
}
