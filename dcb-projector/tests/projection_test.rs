//! Integration tests for the Projection Engine: combined-query semantics
//! and the condition it hands back to a subsequent `append_if`.

use dcb_store::{append, append_if, StoreConfig};
use dcb_types::{FnProjector, InputEvent, Query, QueryItem, StateProjector, Tag};

fn tagged_event(event_type: &str, key: &str, value: &str) -> InputEvent {
    InputEvent::new(event_type, vec![Tag::new(key, value).unwrap()], serde_json::json!({})).unwrap()
}

#[tokio::test]
async fn projector_receives_only_events_matching_its_own_query() {
    let (pool, _container) = dcb_testkit::spawn_postgres().await.expect("postgres");
    let config = StoreConfig::default();

    append(
        &pool,
        &[tagged_event("T1", "k", "a"), tagged_event("T2", "k", "c")],
        &config,
    )
    .await
    .expect("append");

    let query_a = Query::new(vec![QueryItem::new(vec!["T1".to_string()], vec![Tag::new("k", "a").unwrap()]).unwrap()]);
    let query_b = Query::new(vec![QueryItem::new(vec!["T2".to_string()], vec![Tag::new("k", "b").unwrap()]).unwrap()]);

    let projectors: Vec<Box<dyn StateProjector>> = vec![
        Box::new(FnProjector::new("pA", query_a, 0u32, |n, _| n + 1)),
        Box::new(FnProjector::new("pB", query_b, 0u32, |n, _| n + 1)),
    ];

    let (mut states, _condition) = dcb_projector::project(&pool, projectors).await.expect("project");

    assert_eq!(states.take::<u32>("pA"), Some(1));
    assert_eq!(states.take::<u32>("pB"), Some(0));
}

#[tokio::test]
async fn concurrent_projection_and_append_if_allows_exactly_one_winner() {
    let (pool, _container) = dcb_testkit::spawn_postgres().await.expect("postgres");
    let config = StoreConfig::default();

    append(&pool, &[tagged_event("Opened", "concert", "C")], &config).await.expect("seed capacity event");

    let combined_query = Query::new(vec![QueryItem::new(
        vec!["Opened".to_string(), "Booked".to_string()],
        vec![Tag::new("concert", "C").unwrap()],
    )
    .unwrap()]);

    let projectors_1: Vec<Box<dyn StateProjector>> =
        vec![Box::new(FnProjector::new("seats", combined_query.clone(), 0u32, |n, _| n + 1))];
    let projectors_2: Vec<Box<dyn StateProjector>> =
        vec![Box::new(FnProjector::new("seats", combined_query, 0u32, |n, _| n + 1))];

    let (_states_1, condition_1) = dcb_projector::project(&pool, projectors_1).await.expect("project 1");
    let (_states_2, condition_2) = dcb_projector::project(&pool, projectors_2).await.expect("project 2");

    let booking = tagged_event("Booked", "concert", "C");

    let result_1 = append_if(&pool, &[booking.clone()], &condition_1, &config).await;
    let result_2 = append_if(&pool, &[booking], &condition_2, &config).await;

    let successes = [&result_1, &result_2].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one of the two conditional appends must win");
}
