//! Raw event seeding that bypasses the batch-validation path, for tests
//! that want full control over what lands in the log.

use dcb_types::Tag;
use sqlx::PgPool;

/// Insert one event directly via SQL, returning its assigned position.
pub async fn seed_event(
    pool: &PgPool,
    event_type: &str,
    tags: &[Tag],
    data: serde_json::Value,
) -> anyhow::Result<i64> {
    let encoded = dcb_types::tag::encode(tags)?;

    let position: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO events (transaction_id, type, tags, data)
        VALUES (pg_current_xact_id()::text::bigint, $1, $2, $3)
        RETURNING position
        "#,
    )
    .bind(event_type)
    .bind(&encoded)
    .bind(&data)
    .fetch_one(pool)
    .await?;

    Ok(position)
}

/// Insert several events in one transaction, so they share one
/// `transaction_id` the way a real `Append` batch would.
pub async fn seed_events(
    pool: &PgPool,
    events: &[(&str, Vec<Tag>, serde_json::Value)],
) -> anyhow::Result<Vec<i64>> {
    let mut tx = pool.begin().await?;
    let mut positions = Vec::with_capacity(events.len());

    for (event_type, tags, data) in events {
        let encoded = dcb_types::tag::encode(tags)?;
        let position: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO events (transaction_id, type, tags, data)
            VALUES (pg_current_xact_id()::text::bigint, $1, $2, $3)
            RETURNING position
            "#,
        )
        .bind(event_type)
        .bind(&encoded)
        .bind(data)
        .fetch_one(&mut *tx)
        .await?;
        positions.push(position);
    }

    tx.commit().await?;
    Ok(positions)
}
