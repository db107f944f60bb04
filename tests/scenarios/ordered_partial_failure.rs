//! A missing key fails its own slot only; the batch keeps its order.
//!
//! Scenario:
//!
//! 1. Seed `k1` and `k3`, leave `k2` absent.
//! 2. Process a batch of three `get` messages `[k1, k2, k3]`, in both
//!    execution modes.
//!
//! Expected Result:
//!
//! - Three messages come back in their original order.
//! - `k1` and `k3` carry their documents.
//! - `k2` keeps its body and carries a not-found error.

use docstore_processor::ItemErrorKind;
use docstore_processor::Message;
use tokio_util::sync::CancellationToken;

use crate::common::TestContext;

async fn run(mode: &str) {
    let ctx = TestContext::new();
    ctx.seed("k1", b"value1").await;
    ctx.seed("k3", b"value3").await;
    let processor = ctx
        .processor(|c| c.processor.mode = mode.to_string())
        .await;

    let mut batch = vec![Message::new("k1"), Message::new("k2"), Message::new("k3")];
    processor
        .process_batch(&mut batch, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(batch.len(), 3);
    assert_eq!(&batch[0].body()[..], b"value1", "mode {mode}");
    assert_eq!(&batch[1].body()[..], b"k2", "mode {mode}");
    assert_eq!(batch[1].error().map(|e| e.kind()), Some(ItemErrorKind::NotFound));
    assert_eq!(&batch[2].body()[..], b"value3", "mode {mode}");
    assert!(batch[0].error().is_none());
    assert!(batch[2].error().is_none());
}

#[tokio::test]
async fn test_bulk_mode_isolates_missing_key() {
    run("bulk").await;
}

#[tokio::test]
async fn test_concurrent_mode_isolates_missing_key() {
    run("concurrent").await;
}

#[tokio::test]
async fn test_replace_on_absent_key_fails_only_its_slot() {
    let ctx = TestContext::new();
    for key in ["a", "c", "d"] {
        ctx.seed(key, b"old").await;
    }
    let processor = ctx
        .processor(|c| {
            c.processor.operation = Some("replace".to_string());
            c.processor.key = r#"${! meta("id") }"#.to_string();
            c.processor.value = Some("content()".to_string());
        })
        .await;

    let mut batch: Vec<Message> = ["a", "b", "c", "d"]
        .into_iter()
        .map(|id| Message::new(format!("new-{id}")).with_metadata("id", id))
        .collect();
    processor
        .process_batch(&mut batch, &CancellationToken::new())
        .await
        .unwrap();

    let failed: Vec<usize> = batch
        .iter()
        .enumerate()
        .filter(|(_, m)| m.error().is_some())
        .map(|(i, _)| i)
        .collect();
    assert_eq!(failed, vec![1]);
    assert_eq!(batch[1].error().map(|e| e.kind()), Some(ItemErrorKind::NotFound));

    for key in ["a", "c", "d"] {
        let doc = ctx.stored(key).await.unwrap();
        assert_eq!(doc.content, format!("new-{key}").into_bytes());
    }
    assert!(ctx.stored("b").await.is_none());
}
