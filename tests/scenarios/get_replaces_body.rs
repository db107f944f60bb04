//! Get replaces the message body with the stored document.
//!
//! Scenario:
//!
//! 1. Seed raw bytes `hello` at `doc1`.
//! 2. Configure `operation=get` with the default key (`content()`).
//! 3. Process a message whose body is `doc1`.
//!
//! Expected Result:
//!
//! - The output body becomes `hello`.

use docstore_processor::ItemErrorKind;
use docstore_processor::Message;

use crate::common::TestContext;

#[tokio::test]
async fn test_get_replaces_body_with_stored_bytes() {
    let ctx = TestContext::new();
    ctx.seed("doc1", b"hello").await;
    let processor = ctx
        .processor(|c| c.processor.operation = Some("get".to_string()))
        .await;

    let mut message = Message::new("doc1");
    processor.process(&mut message).await.unwrap();

    assert_eq!(&message.body()[..], b"hello");
}

#[tokio::test]
async fn test_get_with_mismatched_transcoder_is_decoding_error() {
    let ctx = TestContext::new();
    ctx.seed("doc1", b"hello").await;
    let processor = ctx
        .processor(|c| c.processor.transcoder = Some("json".to_string()))
        .await;

    let mut message = Message::new("doc1");
    processor.process(&mut message).await.unwrap();

    assert_eq!(&message.body()[..], b"doc1");
    assert_eq!(message.error().map(|e| e.kind()), Some(ItemErrorKind::Decoding));
}
