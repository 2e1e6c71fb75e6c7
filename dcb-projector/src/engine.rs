//! Project / ProjectStream.
//!
//! Events are scanned once against the combined (OR'd) query of every
//! projector, then re-matched per projector in memory (cheaper than one
//! scan per projector when projectors share tags or types, and correct
//! because the in-memory match uses the exact predicate the scan was
//! compiled from).

use dcb_store::{query, query_stream, StoreConfig};
use dcb_types::{AppendCondition, Cursor, DcbError, Query, Result, StateProjector};
use futures::StreamExt;
use sqlx::PgPool;
use std::any::Any;
use std::collections::HashMap;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// The folded state of every projector passed to `project`/`project_stream`,
/// keyed by projector id.
pub struct ProjectedStates(HashMap<String, Box<dyn Any + Send>>);

impl ProjectedStates {
    /// Recover projector `id`'s state as `T`, the type it was built with.
    /// Returns `None` if `id` is absent or was built with a different type.
    pub fn take<T: 'static>(&mut self, id: &str) -> Option<T> {
        self.0.remove(id).and_then(|b| b.downcast::<T>().ok()).map(|b| *b)
    }

    /// The set of projector ids present in this result.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|s| s.as_str())
    }
}

/// Fold `projectors` over every event matching their combined query, in
/// cursor order. Returns the folded states plus the `AppendCondition` a
/// caller should pass to `AppendIf` to guard against concurrent writers.
#[instrument(skip(pool, projectors), fields(op = "project", projector_count = projectors.len()))]
pub async fn project(
    pool: &PgPool,
    projectors: Vec<Box<dyn StateProjector>>,
) -> Result<(ProjectedStates, AppendCondition)> {
    let combined = validate_and_combine(&projectors)?;

    let events = query(pool, &combined, None, None).await?;
    let mut projectors = projectors;
    let mut last_cursor: Option<Cursor> = None;
    let mut folded = 0usize;

    for event in &events {
        last_cursor = Some(event.cursor());
        for projector in projectors.iter_mut() {
            if projector.query().matches(&event.event_type, &event.tags) {
                projector.apply(event);
                folded += 1;
            }
        }
    }

    debug!(projector_count = projectors.len(), events_folded = folded, "project finished");

    let states = finalize(projectors);
    let condition = match last_cursor {
        Some(cursor) => AppendCondition::after(combined, cursor),
        None => AppendCondition::new(combined),
    };

    Ok((states, condition))
}

/// Same contract as `project`, but sourced from the streaming Reader and
/// delivered through two single-value channels so a caller can start
/// consuming as soon as folding finishes without blocking on materializing
/// the whole scan up front.
#[instrument(skip(pool, projectors, config, cancel), fields(op = "project_stream", projector_count = projectors.len()))]
pub fn project_stream(
    pool: PgPool,
    projectors: Vec<Box<dyn StateProjector>>,
    config: StoreConfig,
    cancel: CancellationToken,
) -> (
    oneshot::Receiver<Result<ProjectedStates>>,
    oneshot::Receiver<Result<AppendCondition>>,
) {
    let (states_tx, states_rx) = oneshot::channel();
    let (condition_tx, condition_rx) = oneshot::channel();

    tokio::spawn(async move {
        let combined = match validate_and_combine(&projectors) {
            Ok(q) => q,
            Err(e) => {
                let _ = states_tx.send(Err(clone_err(&e)));
                let _ = condition_tx.send(Err(e));
                return;
            }
        };

        let mut projectors = projectors;
        let mut stream = query_stream(pool, combined.clone(), None, config.stream_buffer, cancel);
        let mut last_cursor: Option<Cursor> = None;
        let mut folded = 0usize;

        while let Some(item) = stream.next().await {
            match item {
                Ok(event) => {
                    last_cursor = Some(event.cursor());
                    for projector in projectors.iter_mut() {
                        if projector.query().matches(&event.event_type, &event.tags) {
                            projector.apply(&event);
                            folded += 1;
                        }
                    }
                }
                Err(e) => {
                    let _ = states_tx.send(Err(clone_err(&e)));
                    let _ = condition_tx.send(Err(e));
                    return;
                }
            }
        }

        debug!(events_folded = folded, "project_stream finished");

        let condition = match last_cursor {
            Some(cursor) => AppendCondition::after(combined, cursor),
            None => AppendCondition::new(combined),
        };

        let states = finalize(projectors);
        let _ = condition_tx.send(Ok(condition));
        let _ = states_tx.send(Ok(states));
    });

    (states_rx, condition_rx)
}

fn validate_and_combine(projectors: &[Box<dyn StateProjector>]) -> Result<Query> {
    if projectors.is_empty() {
        return Err(DcbError::validation("project", "projectors", "empty projector list"));
    }

    let mut seen_ids = std::collections::HashSet::with_capacity(projectors.len());
    let mut combined = Query::empty();

    for p in projectors {
        if p.id().is_empty() {
            return Err(DcbError::validation("project", "projector.id", ""));
        }
        if !seen_ids.insert(p.id().to_string()) {
            return Err(DcbError::validation("project", "projector.id", p.id().to_string()));
        }
        if p.query().is_empty() {
            return Err(DcbError::validation(
                "project",
                "projector.query",
                format!("projector {} has an empty query", p.id()),
            ));
        }
        combined = combined.union(p.query().clone());
    }

    Ok(combined)
}

fn finalize(projectors: Vec<Box<dyn StateProjector>>) -> ProjectedStates {
    let mut map = HashMap::with_capacity(projectors.len());
    for p in projectors {
        let id = p.id().to_string();
        map.insert(id, p.into_state());
    }
    ProjectedStates(map)
}

fn clone_err(err: &DcbError) -> DcbError {
    match err {
        DcbError::Validation { op, field, value } => DcbError::Validation {
            op,
            field,
            value: value.clone(),
        },
        DcbError::Concurrency {
            op,
            reason,
            query_item_count,
            cursor,
        } => DcbError::Concurrency {
            op,
            reason: reason.clone(),
            query_item_count: *query_item_count,
            cursor: *cursor,
        },
        DcbError::Resource { op, source } => {
            DcbError::Resource { op, source: Box::new(std::io::Error::other(source.to_string())) }
        }
        DcbError::TableStructure { op, reason } => DcbError::TableStructure {
            op,
            reason: reason.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcb_types::{FnProjector, QueryItem, Tag};

    fn projector(id: &str, query: Query) -> Box<dyn StateProjector> {
        Box::new(FnProjector::new(id, query, 0u32, |n, _e| n + 1))
    }

    #[test]
    fn rejects_empty_projector_list() {
        assert!(validate_and_combine(&[]).is_err());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let query = Query::new(vec![QueryItem::for_type("T").unwrap()]);
        let projectors = vec![projector("p", query.clone()), projector("p", query)];
        assert!(validate_and_combine(&projectors).is_err());
    }

    #[test]
    fn rejects_empty_query() {
        let projectors = vec![projector("p", Query::empty())];
        assert!(validate_and_combine(&projectors).is_err());
    }

    #[test]
    fn combines_item_lists_across_projectors() {
        let qa = Query::new(vec![QueryItem::for_type("T1").unwrap()]);
        let qb = Query::new(vec![QueryItem::for_type("T2").unwrap()]);
        let combined = validate_and_combine(&[projector("a", qa), projector("b", qb)]).unwrap();
        assert_eq!(combined.items().len(), 2);
    }

    #[test]
    fn projected_states_take_recovers_typed_state() {
        let mut map = HashMap::new();
        map.insert("x".to_string(), Box::new(42u32) as Box<dyn Any + Send>);
        let mut states = ProjectedStates(map);
        assert_eq!(states.take::<u32>("x"), Some(42));
        assert_eq!(states.take::<u32>("missing"), None);
    }

    #[test]
    fn tag_based_projector_query_is_preserved_through_combine() {
        let q = Query::new(vec![QueryItem::for_tags(vec![Tag::new("id", "X").unwrap()])]);
        let combined = validate_and_combine(&[projector("p", q)]).unwrap();
        assert!(combined.matches("AnyType", &[Tag::new("id", "X").unwrap()]));
    }
}
