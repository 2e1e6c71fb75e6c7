//! DCB Projection Engine
//!
//! Folds a set of named `StateProjector`s over one combined scan of the
//! event log and hands back both their folded states and the
//! `AppendCondition` that makes a subsequent `AppendIf` DCB-safe: "append
//! iff no event matching any of these projectors' queries has appeared
//! since this projection was taken."

#![warn(clippy::all)]

mod engine;

pub use engine::{project, project_stream, ProjectedStates};
