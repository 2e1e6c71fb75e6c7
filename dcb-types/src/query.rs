//! Query Model
//!
//! A `Query` is an ordered sequence of `QueryItem`s. An event matches a
//! query iff it matches *any* item (OR across items); it matches an item
//! iff its type is in the item's type set (or the set is empty) *and* its
//! tag set is a superset of the item's tags (AND within an item).

use crate::error::{DcbError, Result};
use crate::tag::{self, Tag};
use serde::{Deserialize, Serialize};

/// One disjunct of a `Query`: a type-set membership check and a
/// tag-superset check, both required (AND).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryItem {
    types: Vec<String>,
    tags: Vec<Tag>,
}

impl QueryItem {
    /// Build an item from a list of event types and a list of tags. Every
    /// type must be non-empty; every tag must be valid (see `Tag::new`).
    pub fn new(types: Vec<String>, tags: Vec<Tag>) -> Result<Self> {
        for t in &types {
            if t.is_empty() {
                return Err(DcbError::validation("QueryItem::new", "types", String::new()));
            }
        }
        Ok(Self { types, tags })
    }

    /// An item matching any event carrying all of `tags`, regardless of
    /// type.
    pub fn for_tags(tags: Vec<Tag>) -> Self {
        Self {
            types: Vec::new(),
            tags,
        }
    }

    /// An item matching any event of `event_type`, regardless of tags.
    pub fn for_type(event_type: impl Into<String>) -> Result<Self> {
        Self::new(vec![event_type.into()], Vec::new())
    }

    /// An item matching everything (empty types, empty tags).
    pub fn everything() -> Self {
        Self {
            types: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// The item's event types (empty means "any type").
    pub fn types(&self) -> &[String] {
        &self.types
    }

    /// The item's required tags.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Does `event_type`/`event_tags` match this item?
    pub fn matches(&self, event_type: &str, event_tags: &[Tag]) -> bool {
        let type_ok = self.types.is_empty() || self.types.iter().any(|t| t == event_type);
        type_ok && tag::is_superset(event_tags, &self.tags)
    }
}

/// An ordered sequence of `QueryItem`s, OR'd together. An empty `Query`
/// matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    items: Vec<QueryItem>,
}

impl Query {
    /// The empty query: matches nothing.
    pub fn empty() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a query from a sequence of items.
    pub fn new(items: Vec<QueryItem>) -> Self {
        Self { items }
    }

    /// A single-item query matching everything.
    pub fn everything() -> Self {
        Self {
            items: vec![QueryItem::everything()],
        }
    }

    /// A single-item query with both a type set and a required tag set.
    pub fn single(types: Vec<String>, tags: Vec<Tag>) -> Result<Self> {
        Ok(Self {
            items: vec![QueryItem::new(types, tags)?],
        })
    }

    /// One item per event type (OR across types, no tag requirement).
    pub fn for_types(types: Vec<String>) -> Result<Self> {
        let items = types
            .into_iter()
            .map(QueryItem::for_type)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { items })
    }

    /// One item per tag (OR across tags, no type requirement).
    pub fn for_tags(tags: Vec<Tag>) -> Self {
        let items = tags.into_iter().map(|t| QueryItem::for_tags(vec![t])).collect();
        Self { items }
    }

    /// Append an item to this query, OR'd with the existing ones.
    pub fn with_item(mut self, item: QueryItem) -> Self {
        self.items.push(item);
        self
    }

    /// The query's items.
    pub fn items(&self) -> &[QueryItem] {
        &self.items
    }

    /// Is this query structurally empty (zero items, matches nothing)?
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Does `event_type`/`event_tags` match any item of this query?
    pub fn matches(&self, event_type: &str, event_tags: &[Tag]) -> bool {
        self.items.iter().any(|i| i.matches(event_type, event_tags))
    }

    /// Concatenate `self`'s items with `other`'s, producing the union
    /// query used to compute a combined `AppendCondition`.
    pub fn union(mut self, other: Query) -> Self {
        self.items.extend(other.items);
        self
    }
}
