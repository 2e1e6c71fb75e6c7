//! Tag Codec
//!
//! A tag is a `(key, value)` pair addressing an event. The codec defines the
//! single canonical on-the-wire and on-disk representation: a `key:value`
//! string, key-sorted, one per tag. Storage and the query compiler both go
//! through this module so they can never drift apart.

use crate::error::{DcbError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A single `(key, value)` pair. Both components are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    key: String,
    value: String,
}

impl Tag {
    /// Construct a tag, validating that both components are non-empty.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let value = value.into();

        if key.is_empty() {
            return Err(DcbError::validation("Tag::new", "key", key));
        }
        if value.is_empty() {
            return Err(DcbError::validation("Tag::new", "value", value));
        }

        Ok(Self { key, value })
    }

    /// The tag's key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The tag's value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Render as the canonical `key:value` string.
    pub fn canonical(&self) -> String {
        format!("{}:{}", self.key, self.value)
    }

    /// Parse a canonical `key:value` string, splitting at the first `:`.
    pub fn parse(raw: &str) -> Result<Self> {
        let (key, value) = raw
            .split_once(':')
            .ok_or_else(|| DcbError::validation("Tag::parse", "tag", raw.to_string()))?;
        Self::new(key, value)
    }
}

impl Ord for Tag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key).then_with(|| self.value.cmp(&other.value))
    }
}

impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Validate a tag set (unique keys) and encode it to its canonical,
/// key-sorted sequence of `key:value` strings.
///
/// This is the single point of truth for tag representation: storage and
/// the query compiler both call `encode`/`decode` rather than formatting
/// tags themselves.
pub fn encode(tags: &[Tag]) -> Result<Vec<String>> {
    let mut seen = std::collections::HashSet::with_capacity(tags.len());
    for tag in tags {
        if !seen.insert(tag.key()) {
            return Err(DcbError::validation("tag::encode", "key", tag.key().to_string()));
        }
    }

    let mut sorted: Vec<&Tag> = tags.iter().collect();
    sorted.sort();
    Ok(sorted.iter().map(|t| t.canonical()).collect())
}

/// Decode a canonical sequence of `key:value` strings back into tags,
/// preserving the input order.
pub fn decode(raw: &[String]) -> Result<Vec<Tag>> {
    raw.iter().map(|s| Tag::parse(s)).collect()
}

/// Does the tag set `tags` contain every tag in `required` (a superset
/// check, used by the query compiler's containment predicate)?
pub fn is_superset(tags: &[Tag], required: &[Tag]) -> bool {
    required.iter().all(|r| tags.contains(r))
}
