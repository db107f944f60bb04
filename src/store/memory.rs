//! In-process document store implementing the connection layer.
//!
//! Buckets hold named collections; every mutation bumps a cluster-wide CAS
//! counter. Availability, per-call latency and per-key faults can be driven
//! from the outside so that transport and per-item failures are reproducible.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::time::sleep;
use tokio::time::timeout;
use tracing::debug;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::Cluster;
use super::Collection;
use super::CollectionHandle;
use super::Document;
use super::ItemOutcome;
use super::DEFAULT_COLLECTION;
use crate::ConnectionConfig;
use crate::ConnectionError;
use crate::ItemError;
use crate::ItemErrorKind;
use crate::StoreCall;
use crate::StoreError;
use crate::TransportError;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug)]
struct ClusterState {
    server: String,
    online: AtomicBool,
    closed: AtomicBool,
    next_cas: AtomicU64,
    /// Uniform budget for every operation kind
    op_timeout: Duration,
    latency: RwLock<Duration>,
    faults: DashMap<String, ItemErrorKind>,
}

impl ClusterState {
    fn check_transport(&self) -> std::result::Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        if !self.online.load(Ordering::Acquire) {
            return Err(TransportError::Unreachable(self.server.clone()));
        }
        Ok(())
    }

    fn next_cas(&self) -> u64 {
        self.next_cas.fetch_add(1, Ordering::AcqRel)
    }
}

type DocumentMap = DashMap<String, Document>;

/// In-memory cluster
#[derive(Debug, Clone)]
pub struct MemoryCluster {
    state: Arc<ClusterState>,
    buckets: Arc<DashMap<String, Arc<DashMap<String, Arc<DocumentMap>>>>>,
}

impl MemoryCluster {
    pub fn new(
        server: impl Into<String>,
        op_timeout: Duration,
    ) -> Self {
        Self {
            state: Arc::new(ClusterState {
                server: server.into(),
                online: AtomicBool::new(true),
                closed: AtomicBool::new(false),
                next_cas: AtomicU64::new(1),
                op_timeout,
                latency: RwLock::new(Duration::ZERO),
                faults: DashMap::new(),
            }),
            buckets: Arc::new(DashMap::new()),
        }
    }

    /// Builds a cluster from connection settings with the configured bucket created.
    pub fn connect(config: &ConnectionConfig) -> std::result::Result<Self, ConnectionError> {
        if config.server.is_empty() {
            return Err(ConnectionError::Unreachable("<empty>".to_string()));
        }
        info!(server = %config.server, bucket = %config.bucket, "connecting in-memory cluster");
        Ok(Self::new(config.server.clone(), config.timeout()).with_bucket(&config.bucket))
    }

    pub fn with_bucket(
        self,
        name: &str,
    ) -> Self {
        self.buckets.entry(name.to_string()).or_default();
        self
    }

    pub fn set_online(
        &self,
        online: bool,
    ) {
        debug!(online, "memory cluster availability changed");
        self.state.online.store(online, Ordering::Release);
    }

    /// Delay applied to every call before it touches the data
    pub fn set_latency(
        &self,
        latency: Duration,
    ) {
        *self.state.latency.write() = latency;
    }

    /// Forces every call on `key` to fail with `kind`
    pub fn inject_fault(
        &self,
        key: impl Into<String>,
        kind: ItemErrorKind,
    ) {
        self.state.faults.insert(key.into(), kind);
    }

    pub fn clear_faults(&self) {
        self.state.faults.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::Acquire)
    }

    fn documents(
        &self,
        bucket: &str,
        name: &str,
    ) -> std::result::Result<Arc<DocumentMap>, ConnectionError> {
        let bucket = self
            .buckets
            .get(bucket)
            .ok_or_else(|| ConnectionError::UnknownBucket(bucket.to_string()))?;
        let documents = bucket.entry(name.to_string()).or_default().value().clone();
        Ok(documents)
    }
}

#[async_trait]
impl Cluster for MemoryCluster {
    async fn wait_until_ready(
        &self,
        bucket: &str,
        wait: Duration,
    ) -> std::result::Result<(), ConnectionError> {
        if self.is_closed() {
            return Err(ConnectionError::Closed);
        }
        if !self.buckets.contains_key(bucket) {
            return Err(ConnectionError::UnknownBucket(bucket.to_string()));
        }

        let poll = async {
            while !self.state.online.load(Ordering::Acquire) {
                sleep(READY_POLL_INTERVAL).await;
            }
        };

        timeout(wait, poll).await.map_err(|_| {
            warn!(bucket, ?wait, "bucket not ready");
            ConnectionError::NotReady {
                bucket: bucket.to_string(),
                timeout: wait,
            }
        })
    }

    fn collection(
        &self,
        bucket: &str,
        name: Option<String>,
    ) -> std::result::Result<CollectionHandle, ConnectionError> {
        let name = name.unwrap_or_else(|| DEFAULT_COLLECTION.to_string());
        let documents = self.documents(bucket, &name)?;
        Ok(Arc::new(MemoryCollection {
            name,
            documents,
            state: self.state.clone(),
        }))
    }

    async fn close(&self) -> std::result::Result<(), ConnectionError> {
        if self.state.closed.swap(true, Ordering::AcqRel) {
            debug!("memory cluster already closed");
        } else {
            info!(server = %self.state.server, "memory cluster closed");
        }
        Ok(())
    }
}

/// Collection handle returned by [`MemoryCluster::collection`]
#[derive(Debug)]
pub struct MemoryCollection {
    name: String,
    documents: Arc<DocumentMap>,
    state: Arc<ClusterState>,
}

impl MemoryCollection {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs one call against the data, honoring latency, faults and the op timeout.
    async fn run(
        &self,
        call: StoreCall,
    ) -> ItemOutcome {
        let latency = *self.state.latency.read();
        if !latency.is_zero() && timeout(self.state.op_timeout, sleep(latency)).await.is_err() {
            return Err(ItemError::timeout(call.key(), self.state.op_timeout));
        }

        if let Some(kind) = self.state.faults.get(call.key()).map(|k| *k) {
            return Err(ItemError::new(kind, format!("injected fault on {}", call.key())));
        }

        self.apply(call)
    }

    fn apply(
        &self,
        call: StoreCall,
    ) -> ItemOutcome {
        trace!(collection = %self.name, key = call.key(), op = %call.operation(), "apply");

        match call {
            StoreCall::Get { key } => self
                .documents
                .get(&key)
                .map(|doc| Some(doc.value().clone()))
                .ok_or_else(|| ItemError::not_found(&key)),
            StoreCall::Insert { key, value } => match self.documents.entry(key) {
                Entry::Occupied(e) => Err(ItemError::already_exists(e.key())),
                Entry::Vacant(e) => {
                    e.insert(Document {
                        content: value.content,
                        flags: value.flags,
                        cas: self.state.next_cas(),
                    });
                    Ok(None)
                }
            },
            StoreCall::Remove { key } => self
                .documents
                .remove(&key)
                .map(|_| None)
                .ok_or_else(|| ItemError::not_found(&key)),
            StoreCall::Replace { key, value } => match self.documents.get_mut(&key) {
                Some(mut doc) => {
                    *doc = Document {
                        content: value.content,
                        flags: value.flags,
                        cas: self.state.next_cas(),
                    };
                    Ok(None)
                }
                None => Err(ItemError::not_found(&key)),
            },
            StoreCall::Upsert { key, value } => {
                self.documents.insert(
                    key,
                    Document {
                        content: value.content,
                        flags: value.flags,
                        cas: self.state.next_cas(),
                    },
                );
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl Collection for MemoryCollection {
    async fn call(
        &self,
        call: StoreCall,
    ) -> std::result::Result<Option<Document>, StoreError> {
        self.state.check_transport()?;
        Ok(self.run(call).await?)
    }

    async fn bulk(
        &self,
        calls: Vec<StoreCall>,
    ) -> std::result::Result<Vec<ItemOutcome>, TransportError> {
        self.state.check_transport()?;

        let mut outcomes = Vec::with_capacity(calls.len());
        for call in calls {
            outcomes.push(self.run(call).await);
        }

        // The link may drop while the round trip is in flight
        self.state.check_transport()?;
        Ok(outcomes)
    }
}
