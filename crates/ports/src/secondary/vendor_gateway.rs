use std::future::Future;
use std::pin::Pin;

use domain::vendor::entity::{ApiRequest, ApiResponse};
use domain::vendor::error::GatewayError;

/// Secondary port for authenticated, queued, rate-limited vendor access.
///
/// Every call is serialized through the implementation's FIFO queue and
/// subject to its rate-limit gate; callers just await the result.
///
/// Uses `Pin<Box<dyn Future>>` return type (instead of RPITIT) so the trait
/// is dyn-compatible and can be shared as `Arc<dyn VendorGateway>`.
pub trait VendorGateway: Send + Sync {
    fn request<'a>(
        &'a self,
        request: ApiRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ApiResponse, GatewayError>> + Send + 'a>>;
}
