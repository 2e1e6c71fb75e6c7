//! Append Engine
//!
//! `append` is unconditional; `append_if` evaluates a DCB condition inside
//! the same transaction as the insert, so there is no intermediate
//! visibility point between the probe and the commit.

use dcb_eventlog::compile_probe;
use dcb_types::{AppendCondition, DcbError, InputEvent, Result};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, instrument, warn};

use crate::config::{IsolationLevel, StoreConfig};
use crate::error::{map_commit_err, resource_err};
use crate::lock;

/// Insert `events` unconditionally at `config.default_append_isolation`.
#[instrument(skip(pool, events, config), fields(op = "append", batch_size = events.len()))]
pub async fn append(pool: &PgPool, events: &[InputEvent], config: &StoreConfig) -> Result<()> {
    validate_batch(events, config)?;

    let mut tx = begin_with_isolation(pool, config.default_append_isolation, "append").await?;
    insert_batch(&mut tx, events).await?;
    tx.commit().await.map_err(|e| map_commit_err("append", e))?;

    debug!(
        batch_size = events.len(),
        isolation = ?config.default_append_isolation,
        "append committed"
    );
    Ok(())
}

/// Insert `events` iff no event matching `condition`'s query (after its
/// cursor) has been committed. The probe and the insert share one
/// transaction; a match aborts it and yields `ConcurrencyError`.
#[instrument(skip(pool, events, condition, config), fields(op = "append_if", batch_size = events.len()))]
pub async fn append_if(
    pool: &PgPool,
    events: &[InputEvent],
    condition: &AppendCondition,
    config: &StoreConfig,
) -> Result<()> {
    validate_batch(events, config)?;

    let isolation = config.default_append_isolation;
    if !isolation.supports_append_if() {
        return Err(DcbError::validation(
            "append_if",
            "default_append_isolation",
            "isolation too weak: AppendIf requires at least RepeatableRead",
        ));
    }

    let mut tx = begin_with_isolation(pool, isolation, "append_if").await?;

    let exists: bool = compile_probe(&condition.query, condition.after_cursor)
        .build_query_scalar()
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| resource_err("append_if", e))?;

    if exists {
        tx.rollback().await.map_err(|e| resource_err("append_if", e))?;
        let err = DcbError::condition_violated(
            "append_if",
            condition.query.items().len(),
            condition.after_cursor,
        );
        warn!(
            query_item_count = condition.query.items().len(),
            cursor = ?condition.after_cursor,
            "append_if condition violated"
        );
        return Err(err);
    }

    lock::acquire_for_batch(&mut tx, events, config.lock_timeout).await?;
    insert_batch(&mut tx, events).await?;
    tx.commit().await.map_err(|e| map_commit_err("append_if", e))?;

    debug!(
        batch_size = events.len(),
        isolation = ?isolation,
        "append_if committed"
    );
    Ok(())
}

fn validate_batch(events: &[InputEvent], config: &StoreConfig) -> Result<()> {
    if events.is_empty() || events.len() > config.max_append_batch_size {
        return Err(DcbError::validation(
            "validate_batch",
            "events",
            format!(
                "batch size {} outside allowed range 1..={}",
                events.len(),
                config.max_append_batch_size
            ),
        ));
    }

    for event in events {
        if event.event_type.is_empty() {
            return Err(DcbError::validation("validate_batch", "event_type", ""));
        }
        dcb_types::tag::encode(&event.tags)?;
    }

    Ok(())
}

async fn begin_with_isolation<'p>(
    pool: &'p PgPool,
    isolation: IsolationLevel,
    op: &'static str,
) -> Result<Transaction<'p, Postgres>> {
    let mut tx = pool.begin().await.map_err(|e| resource_err(op, e))?;
    sqlx::query(&format!("SET TRANSACTION ISOLATION LEVEL {}", isolation.as_sql()))
        .execute(&mut *tx)
        .await
        .map_err(|e| resource_err(op, e))?;
    Ok(tx)
}

async fn insert_batch(tx: &mut Transaction<'_, Postgres>, events: &[InputEvent]) -> Result<()> {
    for event in events {
        let persisted_tags = lock::strip_lock_tags(&event.tags);
        let tags = dcb_types::tag::encode(&persisted_tags)?;
        sqlx::query(
            r#"
            INSERT INTO events (type, tags, data, position, transaction_id, created_at)
            VALUES ($1, $2, $3, nextval('events_position_seq'), pg_current_xact_id()::text::bigint, now())
            "#,
        )
        .bind(&event.event_type)
        .bind(&tags)
        .bind(&event.data)
        .execute(&mut **tx)
        .await
        .map_err(|e| resource_err("insert_batch", e))?;
    }
    Ok(())
}
