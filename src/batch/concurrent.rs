use async_trait::async_trait;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

use super::cancellable;
use super::BatchExecutor;
use crate::BatchError;
use crate::CollectionHandle;
use crate::ItemOutcome;
use crate::StoreCall;
use crate::StoreError;

/// Issues one independent call per item and awaits them all
///
/// Calls complete in any order; outcomes are slotted back by index.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcurrentExecutor {
    /// Upper bound of calls in flight, `0` for unbounded
    max_in_flight: usize,
}

impl ConcurrentExecutor {
    pub fn new(max_in_flight: usize) -> Self {
        Self { max_in_flight }
    }

    async fn drive(
        &self,
        collection: &CollectionHandle,
        calls: Vec<StoreCall>,
    ) -> std::result::Result<Vec<ItemOutcome>, BatchError> {
        let total = calls.len();
        let limit = if self.max_in_flight == 0 {
            total
        } else {
            self.max_in_flight
        };

        let mut slots: Vec<Option<ItemOutcome>> = vec![None; total];
        let mut pending = calls.into_iter().enumerate();
        let mut in_flight = FuturesUnordered::new();

        loop {
            while in_flight.len() < limit {
                match pending.next() {
                    Some((index, call)) => in_flight.push(async move { (index, collection.call(call).await) }),
                    None => break,
                }
            }

            match in_flight.next().await {
                Some((index, Ok(document))) => slots[index] = Some(Ok(document)),
                Some((index, Err(StoreError::Item(e)))) => slots[index] = Some(Err(e)),
                Some((index, Err(StoreError::Transport(e)))) => {
                    // Remaining calls are dropped with `in_flight`
                    warn!("[ConcurrentExecutor] call #{} lost transport: {:?}", index, e);
                    return Err(BatchError::Transport(e));
                }
                None => break,
            }
        }

        let outcomes: Vec<ItemOutcome> = slots.into_iter().flatten().collect();
        if outcomes.len() != total {
            return Err(BatchError::ResultCountMismatch {
                expected: total,
                actual: outcomes.len(),
            });
        }
        Ok(outcomes)
    }
}

#[async_trait]
impl BatchExecutor for ConcurrentExecutor {
    async fn execute(
        &self,
        collection: &CollectionHandle,
        calls: Vec<StoreCall>,
        cancel: &CancellationToken,
    ) -> std::result::Result<Vec<ItemOutcome>, BatchError> {
        if cancel.is_cancelled() {
            return Err(BatchError::Cancelled);
        }
        if calls.is_empty() {
            return Ok(Vec::new());
        }
        let total = calls.len();

        let outcomes = cancellable(cancel, self.drive(collection, calls)).await?;

        debug!("[ConcurrentExecutor] {} calls completed", total);
        Ok(outcomes)
    }
}
