//! Store configuration.
//!
//! Constructed either programmatically (`StoreConfig::default()` plus
//! builder-style setters, the common case for a library embedded in a host
//! application) or from environment variables via `from_env()` for
//! standalone host processes.

use dcb_types::{DcbError, Result};
use std::env;
use std::time::Duration;

/// Transaction isolation level used for an append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    /// `READ COMMITTED`. Sufficient for unconditional `Append`.
    ReadCommitted,
    /// `REPEATABLE READ`. Minimum level that keeps a negative probe result
    /// stable until commit; required for `AppendIf`.
    RepeatableRead,
    /// `SERIALIZABLE`. Also catches write-skew anomalies across disjoint
    /// probes.
    Serializable,
}

impl IsolationLevel {
    /// The `SET TRANSACTION ISOLATION LEVEL ...` clause for this level.
    pub fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }

    /// Is this level strong enough for `AppendIf`'s probe-then-insert
    /// pattern to be safe?
    pub fn supports_append_if(&self) -> bool {
        !matches!(self, IsolationLevel::ReadCommitted)
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "read_committed" | "readcommitted" => Some(IsolationLevel::ReadCommitted),
            "repeatable_read" | "repeatableread" => Some(IsolationLevel::RepeatableRead),
            "serializable" => Some(IsolationLevel::Serializable),
            _ => None,
        }
    }
}

/// Store configuration: batch limits, stream buffering, isolation policy
/// and timeouts.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum number of events accepted in a single `Append`/`AppendIf` call.
    pub max_append_batch_size: usize,
    /// Bounded channel capacity for streaming reads.
    pub stream_buffer: usize,
    /// Isolation level used when the caller does not override it.
    /// Defaults to `Serializable` so concurrent `AppendIf` calls against
    /// overlapping conditions cannot both observe "no match" and commit
    /// disjoint rows (write skew); `RepeatableRead` only guarantees a
    /// stable negative probe for a single writer.
    pub default_append_isolation: IsolationLevel,
    /// Deadline for `Query`/`QueryStream`/`Project`/`ProjectStream`.
    pub query_timeout: Duration,
    /// Deadline for `Append`/`AppendIf`.
    pub append_timeout: Duration,
    /// Deadline for acquiring an advisory lock, when locking is in use.
    pub lock_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_append_batch_size: 1000,
            stream_buffer: 1000,
            default_append_isolation: IsolationLevel::Serializable,
            query_timeout: Duration::from_millis(15_000),
            append_timeout: Duration::from_millis(15_000),
            lock_timeout: Duration::from_millis(5_000),
        }
    }
}

impl StoreConfig {
    /// Set the maximum append batch size.
    pub fn with_max_append_batch_size(mut self, n: usize) -> Self {
        self.max_append_batch_size = n;
        self
    }

    /// Set the streaming buffer capacity.
    pub fn with_stream_buffer(mut self, n: usize) -> Self {
        self.stream_buffer = n;
        self
    }

    /// Set the default append isolation level.
    pub fn with_default_append_isolation(mut self, level: IsolationLevel) -> Self {
        self.default_append_isolation = level;
        self
    }

    /// Load configuration from `DCB_*` environment variables, falling back
    /// to `StoreConfig::default()` for anything unset. Loads a `.env` file
    /// if present, ignoring the error if there isn't one.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        let max_append_batch_size = env_parsed(
            "DCB_MAX_APPEND_BATCH_SIZE",
            defaults.max_append_batch_size,
        )?;
        let stream_buffer = env_parsed("DCB_STREAM_BUFFER", defaults.stream_buffer)?;
        let query_timeout_ms = env_parsed(
            "DCB_QUERY_TIMEOUT_MS",
            defaults.query_timeout.as_millis() as u64,
        )?;
        let append_timeout_ms = env_parsed(
            "DCB_APPEND_TIMEOUT_MS",
            defaults.append_timeout.as_millis() as u64,
        )?;
        let lock_timeout_ms = env_parsed(
            "DCB_LOCK_TIMEOUT_MS",
            defaults.lock_timeout.as_millis() as u64,
        )?;

        let default_append_isolation = match env::var("DCB_DEFAULT_APPEND_ISOLATION") {
            Ok(raw) => IsolationLevel::parse(&raw).ok_or_else(|| {
                DcbError::validation(
                    "StoreConfig::from_env",
                    "DCB_DEFAULT_APPEND_ISOLATION",
                    raw,
                )
            })?,
            Err(_) => defaults.default_append_isolation,
        };

        Ok(Self {
            max_append_batch_size,
            stream_buffer,
            default_append_isolation,
            query_timeout: Duration::from_millis(query_timeout_ms),
            append_timeout: Duration::from_millis(append_timeout_ms),
            lock_timeout: Duration::from_millis(lock_timeout_ms),
        })
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| DcbError::validation("StoreConfig::from_env", key, raw)),
        Err(_) => Ok(default),
    }
}
