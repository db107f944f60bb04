//! Invalid settings fail at construction, before any message is processed.

use std::sync::Arc;

use docstore_processor::Cluster;
use docstore_processor::ConfigurationError;
use docstore_processor::ConnectionError;
use docstore_processor::DocumentProcessor;
use docstore_processor::Error;

use crate::common::TestContext;
use crate::common::BUCKET;

#[tokio::test]
async fn test_insert_without_value_is_value_required() {
    let ctx = TestContext::new();
    let result = ctx
        .try_processor(|c| c.processor.operation = Some("insert".to_string()))
        .await;

    assert!(matches!(
        result,
        Err(Error::Configuration(ConfigurationError::ValueRequired))
    ));
    // nothing reached the store
    assert!(ctx.stored("insert").await.is_none());
}

#[tokio::test]
async fn test_unrecognized_operation_is_invalid_operation() {
    let ctx = TestContext::new();
    let result = ctx
        .try_processor(|c| c.processor.operation = Some("merge".to_string()))
        .await;

    match result {
        Err(Error::Configuration(ConfigurationError::InvalidOperation(name))) => assert_eq!(name, "merge"),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_transcoder_is_invalid_transcoder() {
    let ctx = TestContext::new();
    let result = ctx
        .try_processor(|c| c.processor.transcoder = Some("msgpack".to_string()))
        .await;

    assert!(matches!(
        result,
        Err(Error::Configuration(ConfigurationError::InvalidTranscoder(_)))
    ));
}

#[tokio::test]
async fn test_offline_cluster_is_not_ready() {
    let ctx = TestContext::new();
    ctx.cluster.set_online(false);

    let result = ctx
        .try_processor(|c| c.connection.timeout_in_ms = Some(50))
        .await;

    match result {
        Err(Error::Connection(ConnectionError::NotReady { bucket, .. })) => assert_eq!(bucket, BUCKET),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_bucket_fails_construction() {
    let ctx = TestContext::new();
    let config = ctx.config(|c| c.connection.bucket = "missing".to_string());

    let result = DocumentProcessor::new(&config, Arc::new(ctx.cluster.clone())).await;
    assert!(matches!(
        result,
        Err(Error::Connection(ConnectionError::UnknownBucket(_)))
    ));
    // the cluster itself is still usable
    assert!(ctx.cluster.collection(BUCKET, None).is_ok());
}
