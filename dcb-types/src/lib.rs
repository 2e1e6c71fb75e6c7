//! DCB Core Data Model
//!
//! Pure domain layer for the Dynamic Consistency Boundary (DCB) event log.
//! Contains the value objects shared by every other crate: tags, queries,
//! cursors, append conditions and the projector contract. Zero I/O.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod condition;
mod cursor;
mod error;
mod event;
mod projector;
mod query;

/// Canonical tag encoding/decoding. Exposed as a module rather than
/// flattened, since other crates call `tag::encode`/`tag::decode` directly
/// to stay in lockstep with storage and the query compiler.
pub mod tag;

pub use condition::AppendCondition;
pub use cursor::Cursor;
pub use error::{DcbError, Result};
pub use event::{Event, InputEvent};
pub use projector::{FnProjector, StateProjector};
pub use query::{Query, QueryItem};
pub use tag::Tag;
