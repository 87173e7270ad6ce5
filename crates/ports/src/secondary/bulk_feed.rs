use std::future::Future;
use std::pin::Pin;

use domain::vendor::entity::BulkEntry;
use domain::vendor::error::GatewayError;

/// Secondary port for the signed bulk-download feed variant.
///
/// One call per poll cycle: download the archive for everything newer than
/// `since` and hand back its extracted entries.
pub trait BulkFeedSource: Send + Sync {
    fn fetch_since<'a>(
        &'a self,
        since: Option<u64>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<BulkEntry>, GatewayError>> + Send + 'a>>;
}
