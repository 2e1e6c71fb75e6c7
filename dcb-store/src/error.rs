//! Mapping from `sqlx::Error` to the shared `DcbError` taxonomy.
//!
//! PostgreSQL's `serialization_failure` (SQLSTATE `40001`) is reclassified
//! to `ConcurrencyError` here: from the caller's perspective it is a DCB
//! conflict, not a resource failure, and it is retryable after reprojecting.

use dcb_types::DcbError;

const SERIALIZATION_FAILURE: &str = "40001";

/// Map a backend error encountered while committing an append. A
/// serialization failure becomes a `ConcurrencyError`; anything else is a
/// `ResourceError`.
pub fn map_commit_err(op: &'static str, err: sqlx::Error) -> DcbError {
    if is_serialization_failure(&err) {
        return DcbError::concurrency(op, "serialization failure detected by the backend");
    }
    resource_err(op, err)
}

/// Map a backend error encountered anywhere else (probe, scan, connection
/// acquisition) to a `ResourceError`.
pub fn resource_err(op: &'static str, err: sqlx::Error) -> DcbError {
    DcbError::Resource {
        op,
        source: Box::new(err),
    }
}

fn is_serialization_failure(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(SERIALIZATION_FAILURE)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_error_maps_to_resource_error() {
        let err = sqlx::Error::PoolTimedOut;
        let mapped = map_commit_err("append", err);
        assert!(matches!(mapped, DcbError::Resource { .. }));
    }
}
