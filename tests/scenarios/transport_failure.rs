//! Transport failure fails the whole batch and mutates nothing.
//!
//! Scenario:
//!
//! 1. Build an upsert processor.
//! 2. Take the cluster offline.
//! 3. Process a batch of 5 messages.
//!
//! Expected Result:
//!
//! - The call returns a transport `BatchError`.
//! - All 5 messages are identical to their input.
//! - Nothing was written.

use std::time::Duration;

use docstore_processor::BatchError;
use docstore_processor::Message;
use docstore_processor::TransportError;
use tokio_util::sync::CancellationToken;

use crate::common::TestContext;

fn batch() -> Vec<Message> {
    (1..=5)
        .map(|i| Message::new(format!("body-{i}")).with_metadata("id", format!("k{i}")))
        .collect()
}

#[tokio::test]
async fn test_transport_failure_leaves_all_messages_untouched() {
    let ctx = TestContext::new();
    for mode in ["bulk", "concurrent"] {
        let processor = ctx
            .processor(|c| {
                c.processor.mode = mode.to_string();
                c.processor.operation = Some("upsert".to_string());
                c.processor.key = r#"${! meta("id") }"#.to_string();
                c.processor.value = Some("content()".to_string());
            })
            .await;
        ctx.cluster.set_online(false);

        let mut messages = batch();
        let input = messages.clone();
        let result = processor
            .process_batch(&mut messages, &CancellationToken::new())
            .await;

        assert_eq!(
            result,
            Err(BatchError::Transport(TransportError::Unreachable(
                "memory://integration".to_string()
            ))),
            "mode {mode}"
        );
        assert_eq!(messages, input);

        ctx.cluster.set_online(true);
    }

    for i in 1..=5 {
        assert!(ctx.stored(&format!("k{i}")).await.is_none());
    }
}

#[tokio::test]
async fn test_cancellation_during_round_trip_is_batch_error() {
    let ctx = TestContext::new();
    ctx.seed("k1", b"v").await;
    let processor = ctx.processor(|_| {}).await;
    ctx.cluster.set_latency(Duration::from_millis(300));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let mut messages = vec![Message::new("k1")];
    let result = processor.process_batch(&mut messages, &cancel).await;

    assert_eq!(result, Err(BatchError::Cancelled));
    assert_eq!(&messages[0].body()[..], b"k1");
}
