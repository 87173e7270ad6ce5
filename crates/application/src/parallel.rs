use futures::future::join_all;
use serde_json::Value;

use domain::vendor::entity::ApiRequest;
use ports::secondary::vendor_gateway::VendorGateway;

/// A request tagged with a correlation id so the caller can reassociate
/// results after the fan-out.
#[derive(Debug, Clone)]
pub struct TaggedRequest {
    pub result_id: String,
    pub request: ApiRequest,
}

#[derive(Debug)]
pub struct TaggedResult {
    pub result_id: String,
    /// `None` when the request failed or returned a non-JSON body; fan-outs
    /// tolerate per-request failure.
    pub result: Option<Value>,
}

/// Run independent requests concurrently. Each call still passes through
/// the gateway's FIFO queue and rate-limit gate; concurrency here only
/// overlaps the waiting. Failures become `None` entries and never abort
/// the rest of the fan-out.
pub async fn parallel_requests(
    gateway: &dyn VendorGateway,
    requests: Vec<ApiRequest>,
) -> Vec<Option<Value>> {
    join_all(requests.into_iter().map(|request| async move {
        match gateway.request(request).await {
            Ok(response) => response.into_json(),
            Err(e) => {
                tracing::warn!(error = %e, "fan-out request failed");
                None
            }
        }
    }))
    .await
}

/// Tagged variant of [`parallel_requests`].
pub async fn parallel_tagged_requests(
    gateway: &dyn VendorGateway,
    requests: Vec<TaggedRequest>,
) -> Vec<TaggedResult> {
    join_all(requests.into_iter().map(|tagged| async move {
        let result = match gateway.request(tagged.request).await {
            Ok(response) => response.into_json(),
            Err(e) => {
                tracing::warn!(
                    result_id = %tagged.result_id,
                    error = %e,
                    "fan-out request failed"
                );
                None
            }
        };
        TaggedResult {
            result_id: tagged.result_id,
            result,
        }
    }))
    .await
}
