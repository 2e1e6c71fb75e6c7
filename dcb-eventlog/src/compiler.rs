//! Query Compiler
//!
//! Lowers a `Query` plus an optional after-cursor and limit into
//! parameterized SQL against the `events` table. Every predicate is bound
//! through `sqlx::QueryBuilder`, never interpolated, so a tag value or
//! event type can never escape into the statement text.
//!
//! An item's type-membership check compiles to `type = ANY($n)` (or is
//! omitted when the item's type list is empty); its tag-superset check
//! compiles to `tags @> $n::text[]` (omitted when the item carries no
//! tags). Items are OR'd; an empty query compiles to the literal `FALSE`,
//! matching `Query::matches` returning false for every event.

use dcb_types::{tag, Cursor, Query};
use sqlx::{Postgres, QueryBuilder};

use crate::EVENTS_TABLE;

const SELECT_COLUMNS: &str = "type, tags, data, position, transaction_id, created_at";

/// Build `SELECT <columns> FROM events WHERE <query predicate> [AND cursor]
/// ORDER BY transaction_id, position [LIMIT n]`.
pub fn compile_select<'a>(
    query: &Query,
    after_cursor: Option<Cursor>,
    limit: Option<i64>,
) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {SELECT_COLUMNS} FROM {EVENTS_TABLE}"));
    push_where(&mut qb, query, after_cursor);
    qb.push(" ORDER BY transaction_id, position");

    if let Some(limit) = limit {
        qb.push(" LIMIT ");
        qb.push_bind(limit);
    }

    qb
}

/// Build `SELECT EXISTS(SELECT 1 FROM events WHERE <query predicate> [AND
/// cursor] LIMIT 1)`, used by the append engine's conditional-append probe.
pub fn compile_probe<'a>(query: &Query, after_cursor: Option<Cursor>) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT EXISTS(SELECT 1 FROM {EVENTS_TABLE}"));
    push_where(&mut qb, query, after_cursor);
    qb.push(" LIMIT 1)");
    qb
}

fn push_where<'a>(qb: &mut QueryBuilder<'a, Postgres>, query: &Query, after_cursor: Option<Cursor>) {
    qb.push(" WHERE ");
    push_query_predicate(qb, query);

    if let Some(cursor) = after_cursor {
        qb.push(" AND (transaction_id, position) > (");
        qb.push_bind(cursor.transaction_id);
        qb.push(", ");
        qb.push_bind(cursor.position);
        qb.push(")");
    }
}

fn push_query_predicate<'a>(qb: &mut QueryBuilder<'a, Postgres>, query: &Query) {
    if query.is_empty() {
        qb.push("FALSE");
        return;
    }

    qb.push("(");
    for (i, item) in query.items().iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        push_item_predicate(qb, item);
    }
    qb.push(")");
}

fn push_item_predicate<'a>(qb: &mut QueryBuilder<'a, Postgres>, item: &dcb_types::QueryItem) {
    let has_types = !item.types().is_empty();
    let has_tags = !item.tags().is_empty();

    if !has_types && !has_tags {
        qb.push("TRUE");
        return;
    }

    qb.push("(");

    if has_types {
        qb.push("type = ANY(");
        qb.push_bind(item.types().to_vec());
        qb.push(")");
    }

    if has_types && has_tags {
        qb.push(" AND ");
    }

    if has_tags {
        let encoded = tag::encode(item.tags()).expect("query items carry validated tags");
        qb.push("tags @> ");
        qb.push_bind(encoded);
        qb.push("::text[]");
    }

    qb.push(")");
}

#[cfg(test)]
mod tests {
    use super::*;
    use dcb_types::{QueryItem, Tag};

    fn tag(k: &str, v: &str) -> Tag {
        Tag::new(k, v).unwrap()
    }

    #[test]
    fn empty_query_compiles_to_false() {
        let qb = compile_select(&Query::empty(), None, None);
        assert!(qb.sql().contains("WHERE FALSE"));
    }

    #[test]
    fn everything_query_compiles_to_true() {
        let qb = compile_select(&Query::everything(), None, None);
        assert!(qb.sql().contains("WHERE (TRUE)"));
    }

    #[test]
    fn type_only_item_uses_any() {
        let query = Query::for_types(vec!["Created".to_string()]).unwrap();
        let qb = compile_select(&query, None, None);
        assert!(qb.sql().contains("type = ANY("));
        assert!(!qb.sql().contains("tags @>"));
    }

    #[test]
    fn tag_only_item_uses_containment() {
        let query = Query::new(vec![QueryItem::for_tags(vec![tag("id", "X")])]);
        let qb = compile_select(&query, None, None);
        assert!(qb.sql().contains("tags @> "));
        assert!(qb.sql().contains("::text[]"));
        assert!(!qb.sql().contains("type = ANY"));
    }

    #[test]
    fn combined_item_ands_type_and_tags() {
        let query = Query::single(vec!["Created".to_string()], vec![tag("id", "X")]).unwrap();
        let qb = compile_select(&query, None, None);
        assert!(qb.sql().contains("type = ANY(") && qb.sql().contains(" AND tags @>"));
    }

    #[test]
    fn multiple_items_are_ored() {
        let query = Query::for_types(vec!["A".to_string(), "B".to_string()]).unwrap();
        let qb = compile_select(&query, None, None);
        assert!(qb.sql().contains(" OR "));
    }

    #[test]
    fn after_cursor_adds_row_comparison() {
        let qb = compile_select(&Query::everything(), Some(Cursor::new(3, 7)), None);
        assert!(qb.sql().contains("(transaction_id, position) > ("));
    }

    #[test]
    fn limit_appends_clause() {
        let qb = compile_select(&Query::everything(), None, Some(10));
        assert!(qb.sql().trim_end().ends_with("LIMIT $1") || qb.sql().contains("LIMIT"));
    }

    #[test]
    fn probe_wraps_select_exists() {
        let qb = compile_probe(&Query::everything(), None);
        assert!(qb.sql().starts_with("SELECT EXISTS(SELECT 1 FROM events"));
        assert!(qb.sql().trim_end().ends_with("LIMIT 1)"));
    }

    #[test]
    fn order_by_is_transaction_id_then_position() {
        let qb = compile_select(&Query::everything(), None, None);
        assert!(qb.sql().contains("ORDER BY transaction_id, position"));
    }
}
