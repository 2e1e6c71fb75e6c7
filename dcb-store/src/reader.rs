//! Materialized and streaming reads.

use async_stream::stream;
use dcb_eventlog::{compile_select, EventRow};
use dcb_types::{Cursor, DcbError, Event, Query, Result};
use futures::stream::BoxStream;
use futures::StreamExt;
use sqlx::PgPool;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Read every event matching `query` (after `after_cursor`, if set),
/// bounded by `limit`, in cursor order. Owns the returned buffer.
#[instrument(skip(pool, query), fields(op = "query"))]
pub async fn query(
    pool: &PgPool,
    query: &Query,
    after_cursor: Option<Cursor>,
    limit: Option<i64>,
) -> Result<Vec<Event>> {
    if query.is_empty() {
        return Err(DcbError::validation("query", "query", "empty query matches nothing"));
    }

    let rows = compile_select(query, after_cursor, limit)
        .build_query_as::<EventRow>()
        .fetch_all(pool)
        .await
        .map_err(|e| crate::error::resource_err("query", e))?;

    rows.into_iter().map(EventRow::into_event).collect()
}

/// Stream every event matching `query` (after `after_cursor`, if set), in
/// cursor order, through a bounded channel of capacity `buffer`.
/// Cancelling `cancel` aborts the underlying scan and drops the connection.
#[instrument(skip(pool, query, cancel), fields(op = "query_stream"))]
pub fn query_stream(
    pool: PgPool,
    query: Query,
    after_cursor: Option<Cursor>,
    buffer: usize,
    cancel: CancellationToken,
) -> BoxStream<'static, Result<Event>> {
    if query.is_empty() {
        let err = DcbError::validation("query_stream", "query", "empty query matches nothing");
        return futures::stream::once(async { Err(err) }).boxed();
    }

    let (tx, rx) = mpsc::channel::<Result<Event>>(buffer);

    tokio::spawn(async move {
        let mut qb = compile_select(&query, after_cursor, None);
        let mut rows = qb.build_query_as::<EventRow>().fetch(&pool);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                next = rows.next() => {
                    match next {
                        None => break,
                        Some(Ok(row)) => {
                            let item = row.into_event();
                            let stop = item.is_err();
                            if tx.send(item).await.is_err() {
                                break;
                            }
                            if stop {
                                break;
                            }
                        }
                        Some(Err(e)) => {
                            let _ = tx.send(Err(crate::error::resource_err("query_stream", e))).await;
                            break;
                        }
                    }
                }
            }
        }
    });

    tokio_stream_from_receiver(rx).boxed()
}

fn tokio_stream_from_receiver(mut rx: mpsc::Receiver<Result<Event>>) -> BoxStream<'static, Result<Event>> {
    stream! {
        while let Some(item) = rx.recv().await {
            yield item;
        }
    }
    .boxed()
}
