//! StateProjector
//!
//! A named, pure fold from events matching a query to a state value. The
//! trait is object-safe so the projection engine can fold a heterogeneous
//! list of projectors (different state types) over one combined event
//! scan; callers recover their concrete state type via `into_state`.

use crate::event::Event;
use crate::query::Query;
use std::any::Any;

/// A named fold over events matching its own query.
///
/// Implementors hold their own `id`, `query`, current state and
/// transition function. `apply` is called once per matching event, in
/// cursor order; it must be a pure function of `(state, event)`.
pub trait StateProjector: Send {
    /// Non-empty identifier, unique within one projection call.
    fn id(&self) -> &str;

    /// The query whose matches this projector wants to see.
    fn query(&self) -> &Query;

    /// Fold one event into this projector's state. Only called for
    /// events that match `self.query()`.
    fn apply(&mut self, event: &Event);

    /// Recover the concrete state after folding completes. Callers
    /// downcast the returned `Any` to the type they built the projector
    /// with.
    fn into_state(self: Box<Self>) -> Box<dyn Any + Send>;
}

/// A `StateProjector` built from a plain value and a transition closure,
/// covering the common case without requiring callers to write their own
/// trait impl.
pub struct FnProjector<S, F>
where
    S: Send + 'static,
    F: FnMut(S, &Event) -> S + Send,
{
    id: String,
    query: Query,
    state: Option<S>,
    transition: F,
}

impl<S, F> FnProjector<S, F>
where
    S: Send + 'static,
    F: FnMut(S, &Event) -> S + Send,
{
    /// Build a projector with `id`, `query`, `initial_state` and a pure
    /// `transition` function.
    pub fn new(id: impl Into<String>, query: Query, initial_state: S, transition: F) -> Self {
        Self {
            id: id.into(),
            query,
            state: Some(initial_state),
            transition,
        }
    }
}

impl<S, F> StateProjector for FnProjector<S, F>
where
    S: Send + 'static,
    F: FnMut(S, &Event) -> S + Send,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn query(&self) -> &Query {
        &self.query
    }

    fn apply(&mut self, event: &Event) {
        let current = self.state.take().expect("state present between applies");
        self.state = Some((self.transition)(current, event));
    }

    fn into_state(self: Box<Self>) -> Box<dyn Any + Send> {
        Box::new(self.state.expect("state present at finalize"))
    }
}
