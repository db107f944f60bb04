use docstore_processor::Message;
use tokio_util::sync::CancellationToken;

use crate::common::TestContext;

/// Successful insert, remove, replace and upsert leave every body as it was.
#[tokio::test]
async fn test_successful_mutations_never_touch_body() {
    let ctx = TestContext::new();

    let steps = [
        ("insert", ["a", "b", "c"]),
        ("replace", ["a", "b", "c"]),
        ("upsert", ["c", "d", "e"]),
        ("remove", ["a", "d", "e"]),
    ];

    for (operation, keys) in steps {
        let processor = ctx
            .processor(|c| {
                c.processor.operation = Some(operation.to_string());
                c.processor.key = r#"${! meta("id") }"#.to_string();
                c.processor.value = Some(r#"${! meta("id") }-${! content() }"#.to_string());
            })
            .await;

        let mut batch: Vec<Message> = keys
            .iter()
            .map(|id| Message::new(format!("{operation} body")).with_metadata("id", *id))
            .collect();
        let input = batch.clone();

        processor
            .process_batch(&mut batch, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(batch, input, "{operation} changed a message");
    }

    assert!(ctx.stored("a").await.is_none());
    assert_eq!(&ctx.stored("b").await.unwrap().content[..], b"b-replace body");
    assert_eq!(&ctx.stored("c").await.unwrap().content[..], b"c-upsert body");
}

/// An empty body is passed through, not dropped.
#[tokio::test]
async fn test_upsert_of_empty_body_keeps_message() {
    let ctx = TestContext::new();
    let processor = ctx
        .processor(|c| {
            c.processor.operation = Some("upsert".to_string());
            c.processor.key = r#"${! meta("id") }"#.to_string();
            c.processor.value = Some("content()".to_string());
        })
        .await;

    let mut message = Message::new("").with_metadata("id", "empty");
    processor.process(&mut message).await.unwrap();

    assert!(message.body().is_empty());
    assert!(message.error().is_none());
    assert!(ctx.stored("empty").await.unwrap().content.is_empty());
}
