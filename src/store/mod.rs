//! Store boundary
//!
//! The processor never owns the connection. It receives a [`Cluster`] from the
//! connection layer, asks it for a [`CollectionHandle`], and issues calls
//! through that handle. Implementations must tolerate concurrent batches.

mod memory;
pub use memory::*;


use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
#[cfg(test)]
use mockall::automock;

use crate::ConnectionError;
use crate::ItemError;
use crate::StoreCall;
use crate::StoreError;
use crate::TransportError;

pub const DEFAULT_COLLECTION: &str = "_default";

/// Content held at a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub content: Bytes,
    /// Common flags recording the content format
    pub flags: u32,
    pub cas: u64,
}

/// Outcome of one store call inside a bulk round trip.
/// Reads yield the document, mutations yield `None`.
pub type ItemOutcome = std::result::Result<Option<Document>, ItemError>;

/// Shared, externally owned handle to a collection
pub type CollectionHandle = Arc<dyn Collection>;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Collection: Send + Sync + 'static {
    /// Issues one store call.
    async fn call(
        &self,
        call: StoreCall,
    ) -> std::result::Result<Option<Document>, StoreError>;

    /// Issues every call in one round trip.
    ///
    /// The returned vector is index-aligned with `calls`. A transport failure
    /// invalidates the whole round trip.
    async fn bulk(
        &self,
        calls: Vec<StoreCall>,
    ) -> std::result::Result<Vec<ItemOutcome>, TransportError>;
}

/// Connection layer consumed at construction and shutdown
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Cluster: Send + Sync + 'static {
    async fn wait_until_ready(
        &self,
        bucket: &str,
        timeout: Duration,
    ) -> std::result::Result<(), ConnectionError>;

    /// Opens `name` inside `bucket`, or the default collection when `name` is `None`.
    fn collection(
        &self,
        bucket: &str,
        name: Option<String>,
    ) -> std::result::Result<CollectionHandle, ConnectionError>;

    async fn close(&self) -> std::result::Result<(), ConnectionError>;
}
