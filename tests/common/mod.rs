use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use docstore_processor::Cluster;
use docstore_processor::CollectionHandle;
use docstore_processor::DocstoreConfig;
use docstore_processor::Document;
use docstore_processor::DocumentProcessor;
use docstore_processor::EncodedValue;
use docstore_processor::MemoryCluster;
use docstore_processor::Result;
use docstore_processor::StoreCall;
use docstore_processor::BINARY_FLAGS;

pub const BUCKET: &str = "integration";

// every store call in these tests is local, 500ms is plenty
pub const TIMEOUT_IN_MS: u64 = 500;

/// One in-memory cluster shared between the processor under test and the
/// assertions made on the stored documents.
pub struct TestContext {
    pub cluster: MemoryCluster,
}

impl TestContext {
    pub fn new() -> Self {
        crate::enable_logger();
        Self {
            cluster: MemoryCluster::new("memory://integration", Duration::from_millis(TIMEOUT_IN_MS))
                .with_bucket(BUCKET),
        }
    }

    pub fn config(
        &self,
        configure: impl FnOnce(&mut DocstoreConfig),
    ) -> DocstoreConfig {
        let mut config = DocstoreConfig::default();
        config.connection.server = "memory://integration".to_string();
        config.connection.bucket = BUCKET.to_string();
        config.connection.timeout_in_ms = Some(TIMEOUT_IN_MS);
        configure(&mut config);
        config
    }

    pub async fn try_processor(
        &self,
        configure: impl FnOnce(&mut DocstoreConfig),
    ) -> Result<DocumentProcessor> {
        let config = self.config(configure).validate()?;
        DocumentProcessor::new(&config, Arc::new(self.cluster.clone())).await
    }

    pub async fn processor(
        &self,
        configure: impl FnOnce(&mut DocstoreConfig),
    ) -> DocumentProcessor {
        self.try_processor(configure).await.expect("processor should build")
    }

    pub fn collection(&self) -> CollectionHandle {
        self.cluster
            .collection(BUCKET, None)
            .expect("default collection exists")
    }

    pub async fn seed(
        &self,
        key: &str,
        content: &'static [u8],
    ) {
        self.collection()
            .call(StoreCall::Upsert {
                key: key.to_string(),
                value: EncodedValue {
                    content: Bytes::from_static(content),
                    flags: BINARY_FLAGS,
                },
            })
            .await
            .expect("seed document");
    }

    pub async fn stored(
        &self,
        key: &str,
    ) -> Option<Document> {
        self.collection()
            .call(StoreCall::Get { key: key.to_string() })
            .await
            .ok()
            .flatten()
    }
}
