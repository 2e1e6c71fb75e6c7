//! DCB: a Dynamic Consistency Boundary event store over PostgreSQL.
//!
//! This crate is the single entry point a host application embeds: it
//! wires the Reader, Append Engine and Projection Engine (each living in
//! their own crate) to one connection pool and one `StoreConfig`.
//!
//! ```rust,ignore
//! use dcb::{DcbStore, Query, QueryItem, Tag, InputEvent};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = DcbStore::connect("postgres://localhost/app").await?;
//!     store.migrate().await?;
//!
//!     let event = InputEvent::new(
//!         "Created",
//!         vec![Tag::new("id", "X")?],
//!         serde_json::json!({}),
//!     )?;
//!     store.append(&[event]).await?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

mod store;

pub use dcb_projector::ProjectedStates;
pub use dcb_store::{IsolationLevel, StoreConfig};
pub use dcb_types::{
    AppendCondition, Cursor, DcbError, Event, FnProjector, InputEvent, Query, QueryItem, Result,
    StateProjector, Tag,
};
pub use store::DcbStore;

/// Install a `tracing_subscriber` registry reading `RUST_LOG`, the
/// convention every host process embedding this crate is expected to
/// follow for consistent log output.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let _ = tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .try_init();
}
