//! Assertion helpers for the cursor/DCB properties.

use dcb_types::{Cursor, Event, Query};
use sqlx::PgPool;

/// Assert that `events` is strictly increasing in cursor order, panicking
/// with the offending pair if not (property 1, "Total order").
pub fn assert_total_order(events: &[Event]) {
    for window in events.windows(2) {
        let (a, b) = (&window[0], &window[1]);
        assert!(
            a.cursor() < b.cursor(),
            "expected strict cursor order, got {:?} then {:?}",
            a.cursor(),
            b.cursor()
        );
    }
}

/// Assert that no event matching `query` exists after `cursor` (used to
/// confirm a `ConcurrencyError` left the log exactly as a failed
/// `AppendIf` promised).
pub async fn assert_no_matching_event_after(pool: &PgPool, query: &Query, cursor: Option<Cursor>) {
    let rows = dcb_store::query(pool, query, cursor, None)
        .await
        .expect("query should succeed against a reachable test database");
    assert!(
        rows.is_empty(),
        "expected no event matching the query after {cursor:?}, found {}",
        rows.len()
    );
}
