//! Integration tests for the Append Engine against a real Postgres
//! container: batch validation, DCB condition evaluation, and cursor
//! resume.

use dcb_store::{append, append_if, query, query_stream, StoreConfig};
use dcb_types::{AppendCondition, InputEvent, Query, QueryItem, Tag};
use tokio_util::sync::CancellationToken;

fn event(event_type: &str, id: &str) -> InputEvent {
    InputEvent::new(event_type, vec![Tag::new("id", id).unwrap()], serde_json::json!({})).unwrap()
}

#[tokio::test]
async fn append_if_detects_concurrent_creation() {
    let (pool, _container) = dcb_testkit::spawn_postgres().await.expect("postgres");
    let config = StoreConfig::default();

    append(&pool, &[event("Created", "X")], &config).await.expect("first append succeeds");

    let condition = AppendCondition::new(Query::single(vec!["Created".to_string()], vec![Tag::new("id", "X").unwrap()]).unwrap());

    let result = append_if(&pool, &[event("Created", "X")], &condition, &config).await;
    assert!(matches!(result, Err(dcb_types::DcbError::Concurrency { .. })));
}

#[tokio::test]
async fn append_if_succeeds_with_no_contention() {
    let (pool, _container) = dcb_testkit::spawn_postgres().await.expect("postgres");
    let config = StoreConfig::default();

    let condition = AppendCondition::new(Query::single(vec!["Created".to_string()], vec![Tag::new("id", "Y").unwrap()]).unwrap());

    let result = append_if(&pool, &[event("Created", "Y")], &condition, &config).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn oversized_batch_is_rejected_and_log_is_unchanged() {
    let (pool, _container) = dcb_testkit::spawn_postgres().await.expect("postgres");
    let config = StoreConfig::default().with_max_append_batch_size(2);

    let events = vec![event("X", "1"), event("X", "2"), event("X", "3")];
    let result = append(&pool, &events, &config).await;
    assert!(result.is_err());

    let query_items = Query::new(vec![QueryItem::for_type("X").unwrap()]);
    let rows = query(&pool, &query_items, None, None).await.expect("query");
    assert_eq!(rows.len(), 0);
}

#[tokio::test]
async fn cursor_resume_yields_exactly_the_remaining_events() {
    let (pool, _container) = dcb_testkit::spawn_postgres().await.expect("postgres");
    let config = StoreConfig::default();

    append(
        &pool,
        &[event("R", "1"), event("R", "2"), event("R", "3")],
        &config,
    )
    .await
    .expect("batch append");

    let query_items = Query::new(vec![QueryItem::for_type("R").unwrap()]);
    let all = query(&pool, &query_items, None, None).await.expect("query all");
    assert_eq!(all.len(), 3);

    let cursor_after_first = all[0].cursor();
    let remaining = query(&pool, &query_items, Some(cursor_after_first), None).await.expect("query remaining");
    assert_eq!(remaining.len(), 2);
    assert_eq!(remaining[0].tags, all[1].tags);
    assert_eq!(remaining[1].tags, all[2].tags);
}

#[tokio::test]
async fn streaming_read_respects_cursor_and_cancellation() {
    let (pool, _container) = dcb_testkit::spawn_postgres().await.expect("postgres");
    let config = StoreConfig::default();

    append(&pool, &[event("S", "1"), event("S", "2")], &config).await.expect("append");

    let query_items = Query::new(vec![QueryItem::for_type("S").unwrap()]);
    let cancel = CancellationToken::new();
    let mut stream = query_stream(pool.clone(), query_items, None, config.stream_buffer, cancel.clone());

    use futures::StreamExt;
    let first = stream.next().await.expect("at least one event").expect("ok");
    assert_eq!(first.event_type, "S");
    cancel.cancel();
}
