use docstore_processor::ItemErrorKind;
use docstore_processor::Message;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::common::TestContext;

fn random_payload(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// upsert(key, payload) then get(key) yields payload, for every transcoder
/// that accepts it.
#[tokio::test]
async fn test_upsert_then_get_yields_payload() {
    let ctx = TestContext::new();

    for transcoder in ["raw", "rawstring", "legacy"] {
        let writer = ctx
            .processor(|c| {
                c.processor.operation = Some("upsert".to_string());
                c.processor.transcoder = Some(transcoder.to_string());
                c.processor.key = r#"${! meta("id") }"#.to_string();
                c.processor.value = Some("content()".to_string());
            })
            .await;
        let reader = ctx
            .processor(|c| c.processor.transcoder = Some(transcoder.to_string()))
            .await;

        for i in 0..10 {
            let key = format!("{transcoder}-{i}");
            let payload = random_payload(1 + i * 7);

            let mut write = Message::new(payload.clone()).with_metadata("id", key.clone());
            writer.process(&mut write).await.unwrap();
            assert!(write.error().is_none());

            let mut read = Message::new(key);
            reader.process(&mut read).await.unwrap();
            assert_eq!(&read.body()[..], payload.as_bytes(), "transcoder {transcoder}");
        }
    }
}

#[tokio::test]
async fn test_json_round_trip_preserves_document() {
    let ctx = TestContext::new();
    let writer = ctx
        .processor(|c| {
            c.processor.operation = Some("upsert".to_string());
            c.processor.transcoder = Some("json".to_string());
            c.processor.key = r#"${! json("id") }"#.to_string();
            c.processor.value = Some("root = this".to_string());
        })
        .await;
    let reader = ctx
        .processor(|c| c.processor.transcoder = Some("rawjson".to_string()))
        .await;

    let document = r#"{"id":"user-1","tags":["a","b"],"score":12.5}"#;
    let mut write = Message::new(document);
    writer.process(&mut write).await.unwrap();

    let mut read = Message::new("user-1");
    reader.process(&mut read).await.unwrap();

    let expected: serde_json::Value = serde_json::from_str(document).unwrap();
    let actual: serde_json::Value = serde_json::from_slice(read.body()).unwrap();
    assert_eq!(actual, expected);
}

/// remove(key) then get(key) is a per-item not-found, not a batch failure.
#[tokio::test]
async fn test_remove_then_get_is_not_found() {
    let ctx = TestContext::new();
    ctx.seed("gone", b"soon").await;

    let remover = ctx
        .processor(|c| c.processor.operation = Some("remove".to_string()))
        .await;
    let reader = ctx.processor(|_| {}).await;

    let mut remove = Message::new("gone");
    remover.process(&mut remove).await.unwrap();
    assert!(remove.error().is_none());

    let mut batch = vec![Message::new("gone")];
    let result = reader.process_batch(&mut batch, &CancellationToken::new()).await;

    assert!(result.is_ok());
    assert_eq!(batch[0].error().map(|e| e.kind()), Some(ItemErrorKind::NotFound));
}
