//! Batch execution
//!
//! A batch is the ordered set of store calls produced for a message batch.
//! Executors submit it to the collection and hand back one outcome per call,
//! in call order. Two strategies are available:
//! - [`BulkExecutor`]: a single bulk round trip
//! - [`ConcurrentExecutor`]: independent single calls awaited together
//!
//! Both honor the same contract: a transport failure or cancellation fails the
//! whole batch and discards any outcome that had already arrived.

mod bulk;
mod concurrent;
pub use bulk::*;
pub use concurrent::*;


use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::BatchError;
use crate::CollectionHandle;
use crate::ConfigurationError;
use crate::ItemError;
use crate::ItemOutcome;
use crate::StoreCall;

/// What a single request produced, ready to be written onto its message
#[derive(Debug, Clone, PartialEq)]
pub enum OperationResult {
    /// Document content copied verbatim into the body
    RawBytes(Bytes),
    /// Decoded document, serialized back into the body
    StructuredValue(serde_json::Value),
    /// Mutation without document content; the body passes through
    Empty,
    Error(ItemError),
}

impl OperationResult {
    pub fn is_err(&self) -> bool {
        matches!(self, OperationResult::Error(_))
    }
}

#[async_trait]
pub trait BatchExecutor: Send + Sync + 'static {
    /// Executes `calls` against `collection`.
    ///
    /// # Returns
    /// Outcomes index-aligned with `calls`.
    ///
    /// # Errors
    /// [`BatchError`] when the round trip fails as a whole or `cancel` fires.
    async fn execute(
        &self,
        collection: &CollectionHandle,
        calls: Vec<StoreCall>,
        cancel: &CancellationToken,
    ) -> std::result::Result<Vec<ItemOutcome>, BatchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    #[default]
    Bulk,
    Concurrent,
}

impl FromStr for ExecutionMode {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "bulk" => Ok(ExecutionMode::Bulk),
            "concurrent" => Ok(ExecutionMode::Concurrent),
            other => Err(ConfigurationError::InvalidMode(other.to_string())),
        }
    }
}

impl ExecutionMode {
    /// `max_in_flight` only bounds the concurrent mode; `0` means unbounded.
    pub fn executor(
        &self,
        max_in_flight: usize,
    ) -> Arc<dyn BatchExecutor> {
        match self {
            ExecutionMode::Bulk => Arc::new(BulkExecutor),
            ExecutionMode::Concurrent => Arc::new(ConcurrentExecutor::new(max_in_flight)),
        }
    }
}

/// Races `fut` against `cancel`. A token already fired means nothing is submitted.
pub(crate) async fn cancellable<F, T>(
    cancel: &CancellationToken,
    fut: F,
) -> std::result::Result<T, BatchError>
where
    F: Future<Output = std::result::Result<T, BatchError>>,
{
    if cancel.is_cancelled() {
        return Err(BatchError::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(BatchError::Cancelled),
        result = fut => result,
    }
}
