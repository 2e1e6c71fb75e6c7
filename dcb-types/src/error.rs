//! Error Taxonomy
//!
//! One enum, one variant per failure class, each carrying the failing
//! operation name plus whatever structured context lets a caller decide
//! whether to retry without parsing the `Display` message.

use crate::cursor::Cursor;
use thiserror::Error;

/// Classified DCB store error.
#[derive(Debug, Error)]
pub enum DcbError {
    /// Caller supplied invalid input. Not retryable.
    #[error("validation error in {op}: field `{field}` has invalid value `{value}`")]
    Validation {
        /// The operation that rejected the input.
        op: &'static str,
        /// The offending field's name.
        field: &'static str,
        /// The offending value, rendered for diagnostics.
        value: String,
    },

    /// A DCB condition was violated, a backend serialization failure
    /// occurred, or an advisory lock timed out. Retryable by reprojecting
    /// and retrying.
    #[error("concurrency conflict in {op}: {reason}")]
    Concurrency {
        /// The operation that detected the conflict.
        op: &'static str,
        /// Human-readable reason (condition violated / serialization
        /// failure / lock timeout).
        reason: String,
        /// Number of items in the condition's query, for diagnostics.
        query_item_count: usize,
        /// The cursor the condition was anchored at, if any.
        cursor: Option<Cursor>,
    },

    /// Backend I/O failure: unreachable, pool exhaustion, network drop.
    /// May be retryable depending on the transport.
    #[error("resource error in {op}: {source}")]
    Resource {
        /// The operation that failed.
        op: &'static str,
        /// The underlying transport/backend error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The backend schema does not match what the engine expects. Fatal
    /// until an operator intervenes.
    #[error("table structure error in {op}: {reason}")]
    TableStructure {
        /// The operation that detected the mismatch.
        op: &'static str,
        /// Description of the mismatch.
        reason: String,
    },
}

impl DcbError {
    /// Build a `Validation` error.
    pub fn validation(op: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        Self::Validation {
            op,
            field,
            value: value.into(),
        }
    }

    /// Build a `Concurrency` error not anchored at a specific condition
    /// (e.g. an advisory-lock timeout).
    pub fn concurrency(op: &'static str, reason: impl Into<String>) -> Self {
        Self::Concurrency {
            op,
            reason: reason.into(),
            query_item_count: 0,
            cursor: None,
        }
    }

    /// Build a `Concurrency` error tagged with the failing condition, for
    /// diagnostics.
    pub fn condition_violated(
        op: &'static str,
        query_item_count: usize,
        cursor: Option<Cursor>,
    ) -> Self {
        Self::Concurrency {
            op,
            reason: "append condition violated: a matching event was already committed".into(),
            query_item_count,
            cursor,
        }
    }

    /// Build a `TableStructure` error.
    pub fn table_structure(op: &'static str, reason: impl Into<String>) -> Self {
        Self::TableStructure {
            op,
            reason: reason.into(),
        }
    }

    /// True if a caller can reasonably retry this error by reprojecting
    /// state and attempting the operation again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Concurrency { .. } | Self::Resource { .. })
    }
}

/// Result alias used throughout the DCB crates.
pub type Result<T> = std::result::Result<T, DcbError>;
