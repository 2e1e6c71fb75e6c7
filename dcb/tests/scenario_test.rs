//! End-to-end scenarios against the public facade, mirroring the
//! documented "unique-entity creation" and "batch atomicity" behavior.

use dcb::{DcbStore, FnProjector, InputEvent, Query, QueryItem, StateProjector, StoreConfig, Tag};

async fn store() -> (DcbStore, testcontainers::ContainerAsync<testcontainers_modules::postgres::Postgres>) {
    let (pool, container) = dcb_testkit::spawn_postgres().await.expect("postgres");
    (DcbStore::with_config(pool, StoreConfig::default()), container)
}

#[tokio::test]
async fn unique_entity_creation_then_conflicting_append_if_fails() {
    let (store, _container) = store().await;

    let created = InputEvent::new("Created", vec![Tag::new("id", "X").unwrap()], serde_json::json!({})).unwrap();
    store.append(&[created.clone()]).await.expect("first create succeeds");

    let exists_query = Query::new(vec![QueryItem::new(vec!["Created".to_string()], vec![Tag::new("id", "X").unwrap()]).unwrap()]);
    let projector: Box<dyn StateProjector> = Box::new(FnProjector::new("exists", exists_query.clone(), false, |_, _| true));

    let (mut states, condition) = store.project(vec![projector]).await.expect("project");
    assert_eq!(states.take::<bool>("exists"), Some(true));

    let result = store.append_if(&[created], &condition).await;
    assert!(matches!(result, Err(dcb::DcbError::Concurrency { .. })));
}

#[tokio::test]
async fn batch_over_the_configured_limit_leaves_the_log_untouched() {
    let (pool, _container) = dcb_testkit::spawn_postgres().await.expect("postgres");
    let store = DcbStore::with_config(pool, StoreConfig::default().with_max_append_batch_size(2));

    let events: Vec<InputEvent> = (0..3)
        .map(|i| InputEvent::new("X", vec![Tag::new("id", i.to_string()).unwrap()], serde_json::json!({})).unwrap())
        .collect();

    let result = store.append(&events).await;
    assert!(result.is_err());

    let query = Query::new(vec![QueryItem::for_type("X").unwrap()]);
    let rows = store.query(&query, None, None).await.expect("query");
    assert_eq!(rows.len(), 0);
}
