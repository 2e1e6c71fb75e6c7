//! Append Condition
//!
//! A `Query` plus an optional `Cursor`. An `AppendIf` succeeds only if no
//! event matching the query has committed strictly after the cursor (or
//! anywhere at all, if the cursor is absent).

use crate::cursor::Cursor;
use crate::query::Query;
use serde::{Deserialize, Serialize};

/// "Fail the append iff any event matching `query` exists strictly after
/// `after_cursor` (or anywhere, if `after_cursor` is absent)."
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendCondition {
    /// The query whose matches would conflict with the append.
    pub query: Query,
    /// Exclusive lower bound; `None` means "anywhere in the log".
    pub after_cursor: Option<Cursor>,
}

impl AppendCondition {
    /// Build a condition with no cursor: fails if `query` matches any
    /// event anywhere in the log.
    pub fn new(query: Query) -> Self {
        Self {
            query,
            after_cursor: None,
        }
    }

    /// Build a condition anchored at `cursor`: fails only if `query`
    /// matches an event committed after it.
    pub fn after(query: Query, cursor: Cursor) -> Self {
        Self {
            query,
            after_cursor: Some(cursor),
        }
    }
}
