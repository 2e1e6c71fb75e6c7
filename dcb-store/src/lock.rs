//! Optional advisory locking (experimental, off by default).
//!
//! Events carrying a tag whose key begins with `lock:` cause the engine to
//! acquire a transaction-scoped advisory lock keyed by a stable hash of the
//! tag's canonical `key:value` string. Locks are acquired in ascending
//! sorted order across the batch to avoid deadlocking against another
//! writer locking the same keys in a different order. Lock tags are
//! stripped from the persisted tag set before insertion.

use dcb_types::{DcbError, InputEvent, Result, Tag};
use sha2::{Digest, Sha256};
use sqlx::{Postgres, Transaction};
use std::time::Duration;

const LOCK_KEY_PREFIX: &str = "lock:";

/// Acquire one transaction-scoped advisory lock per distinct `lock:` tag
/// present anywhere in `events`, sorted ascending by hash, each bounded by
/// `timeout`. A lock that cannot be acquired in time surfaces as
/// `ConcurrencyError`.
pub async fn acquire_for_batch(
    tx: &mut Transaction<'_, Postgres>,
    events: &[InputEvent],
    timeout: Duration,
) -> Result<()> {
    let mut keys: Vec<i64> = lock_tags(events).iter().map(|t| stable_hash(t)).collect();
    keys.sort_unstable();
    keys.dedup();

    for key in keys {
        acquire_one(tx, key, timeout).await?;
    }
    Ok(())
}

/// Tags persisted to storage: every tag except `lock:`-prefixed ones.
pub fn strip_lock_tags(tags: &[Tag]) -> Vec<Tag> {
    tags.iter()
        .filter(|t| !t.key().starts_with(LOCK_KEY_PREFIX))
        .cloned()
        .collect()
}

fn lock_tags(events: &[InputEvent]) -> Vec<Tag> {
    events
        .iter()
        .flat_map(|e| e.tags.iter())
        .filter(|t| t.key().starts_with(LOCK_KEY_PREFIX))
        .cloned()
        .collect()
}

fn stable_hash(tag: &Tag) -> i64 {
    let digest = Sha256::digest(tag.canonical().as_bytes());
    i64::from_be_bytes(digest[0..8].try_into().expect("sha256 digest is at least 8 bytes"))
}

async fn acquire_one(tx: &mut Transaction<'_, Postgres>, key: i64, timeout: Duration) -> Result<()> {
    sqlx::query("SET LOCAL lock_timeout = $1")
        .bind(format!("{}ms", timeout.as_millis()))
        .execute(&mut **tx)
        .await
        .map_err(|e| crate::error::resource_err("acquire_for_batch", e))?;

    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(key)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            if is_lock_timeout(&e) {
                DcbError::concurrency("acquire_for_batch", "advisory lock acquisition timed out")
            } else {
                crate::error::resource_err("acquire_for_batch", e)
            }
        })?;

    Ok(())
}

fn is_lock_timeout(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("55P03"))
}
