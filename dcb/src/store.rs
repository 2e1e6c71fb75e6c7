//! `DcbStore`: the facade a host application constructs once and shares.

use dcb_projector::ProjectedStates;
use dcb_store::StoreConfig;
use dcb_types::{AppendCondition, Cursor, DcbError, Event, InputEvent, Query, Result, StateProjector};
use futures::stream::BoxStream;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// A DCB event store bound to one connection pool and one configuration.
/// Cheap to clone (the pool is internally reference-counted); construct
/// once per process and share.
#[derive(Clone)]
pub struct DcbStore {
    pool: PgPool,
    config: StoreConfig,
}

impl DcbStore {
    /// Wrap an existing pool with default configuration.
    pub fn new(pool: PgPool) -> Self {
        Self::with_config(pool, StoreConfig::default())
    }

    /// Wrap an existing pool with an explicit configuration.
    pub fn with_config(pool: PgPool, config: StoreConfig) -> Self {
        Self { pool, config }
    }

    /// Open a new pool against `database_url` with default configuration.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        Self::connect_with_config(database_url, StoreConfig::default()).await
    }

    /// Open a new pool against `database_url` with an explicit configuration.
    pub async fn connect_with_config(database_url: &str, config: StoreConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new().connect(database_url).await?;
        Ok(Self::with_config(pool, config))
    }

    /// The underlying connection pool, for callers that need to share it
    /// with other components of the host application.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the core's own migrations. Idempotent.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        dcb_db::migrate(&self.pool).await
    }

    /// Unconditionally append `events`.
    pub async fn append(&self, events: &[InputEvent]) -> Result<()> {
        with_deadline("append", self.config.append_timeout, dcb_store::append(&self.pool, events, &self.config)).await
    }

    /// Append `events` iff no event matching `condition` has committed.
    pub async fn append_if(&self, events: &[InputEvent], condition: &AppendCondition) -> Result<()> {
        with_deadline(
            "append_if",
            self.config.append_timeout,
            dcb_store::append_if(&self.pool, events, condition, &self.config),
        )
        .await
    }

    /// Materialized read: every event matching `query`, after `after_cursor`
    /// if set, bounded by `limit`, in cursor order.
    pub async fn query(&self, query: &Query, after_cursor: Option<Cursor>, limit: Option<i64>) -> Result<Vec<Event>> {
        with_deadline("query", self.config.query_timeout, dcb_store::query(&self.pool, query, after_cursor, limit)).await
    }

    /// Streaming read, cancellable via `cancel`, bounded by the
    /// configured stream buffer.
    pub fn query_stream(&self, query: Query, after_cursor: Option<Cursor>, cancel: CancellationToken) -> BoxStream<'static, Result<Event>> {
        dcb_store::query_stream(self.pool.clone(), query, after_cursor, self.config.stream_buffer, cancel)
    }

    /// Fold `projectors` over their combined query and return the states
    /// plus the `AppendCondition` a subsequent `append_if` needs to stay
    /// DCB-safe.
    pub async fn project(&self, projectors: Vec<Box<dyn StateProjector>>) -> Result<(ProjectedStates, AppendCondition)> {
        with_deadline("project", self.config.query_timeout, dcb_projector::project(&self.pool, projectors)).await
    }

    /// Streaming variant of `project`, delivered through two single-value
    /// channels as soon as folding over the underlying streaming read
    /// completes.
    pub fn project_stream(
        &self,
        projectors: Vec<Box<dyn StateProjector>>,
        cancel: CancellationToken,
    ) -> (oneshot::Receiver<Result<ProjectedStates>>, oneshot::Receiver<Result<AppendCondition>>) {
        dcb_projector::project_stream(self.pool.clone(), projectors, self.config.clone(), cancel)
    }
}

async fn with_deadline<F, T>(op: &'static str, deadline: std::time::Duration, fut: F) -> Result<T>
where
    F: std::future::Future<Output = Result<T>>,
{
    match timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(DcbError::Resource {
            op,
            source: Box::new(std::io::Error::new(std::io::ErrorKind::TimedOut, "operation deadline exceeded")),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deadline_wraps_timeout_as_resource_error() {
        let result: Result<()> = with_deadline("test", std::time::Duration::from_millis(1), async {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(DcbError::Resource { .. })));
    }
}
