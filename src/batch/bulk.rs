use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;

use super::cancellable;
use super::BatchExecutor;
use crate::BatchError;
use crate::CollectionHandle;
use crate::ItemOutcome;
use crate::StoreCall;

/// Submits the whole batch as one bulk call
#[derive(Debug, Clone, Copy, Default)]
pub struct BulkExecutor;

#[async_trait]
impl BatchExecutor for BulkExecutor {
    async fn execute(
        &self,
        collection: &CollectionHandle,
        calls: Vec<StoreCall>,
        cancel: &CancellationToken,
    ) -> std::result::Result<Vec<ItemOutcome>, BatchError> {
        if cancel.is_cancelled() {
            return Err(BatchError::Cancelled);
        }
        let expected = calls.len();
        if expected == 0 {
            return Ok(Vec::new());
        }

        let outcomes = cancellable(cancel, async {
            collection.bulk(calls).await.map_err(|e| {
                error!("[BulkExecutor] bulk call failed: {:?}", e);
                BatchError::from(e)
            })
        })
        .await?;

        if outcomes.len() != expected {
            error!(
                "[BulkExecutor] store answered {} results for {} calls",
                outcomes.len(),
                expected
            );
            return Err(BatchError::ResultCountMismatch {
                expected,
                actual: outcomes.len(),
            });
        }

        debug!("[BulkExecutor] {} calls completed", expected);
        Ok(outcomes)
    }
}
