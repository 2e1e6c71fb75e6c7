//! Event and InputEvent
//!
//! `InputEvent` is what a caller builds; `Event` is what the log hands
//! back once `position`, `transaction_id` and `created_at` have been
//! assigned at append time.

use crate::cursor::Cursor;
use crate::error::{DcbError, Result};
use crate::tag::Tag;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The caller-facing event before insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputEvent {
    /// Non-empty event type name.
    pub event_type: String,
    /// Tags addressing this event, unique keys.
    pub tags: Vec<Tag>,
    /// Opaque payload, validated as JSON when the backend requires it.
    pub data: serde_json::Value,
}

impl InputEvent {
    /// Build an input event. Type emptiness and tag-key uniqueness are
    /// validated eagerly so batch validation can fail fast.
    pub fn new(
        event_type: impl Into<String>,
        tags: Vec<Tag>,
        data: serde_json::Value,
    ) -> Result<Self> {
        let event_type = event_type.into();
        if event_type.is_empty() {
            return Err(DcbError::validation("InputEvent::new", "event_type", event_type));
        }

        // Eagerly reject duplicate tag keys; the canonical encoding used
        // at append time would reject them too, but failing here keeps
        // the error at construction instead of deep inside the engine.
        crate::tag::encode(&tags)?;

        Ok(Self {
            event_type,
            tags,
            data,
        })
    }
}

/// A persisted event: an `InputEvent` plus the identifiers the log
/// assigned it at commit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Non-empty event type name.
    pub event_type: String,
    /// Canonically-stored tags.
    pub tags: Vec<Tag>,
    /// Opaque payload.
    pub data: serde_json::Value,
    /// Monotonically increasing, unique position within the log.
    pub position: i64,
    /// Commit identifier of the transaction that inserted this event.
    pub transaction_id: i64,
    /// Wall-clock insertion timestamp.
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// This event's resume point.
    pub fn cursor(&self) -> Cursor {
        Cursor::new(self.transaction_id, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_type() {
        assert!(InputEvent::new("", vec![], serde_json::json!({})).is_err());
    }

    #[test]
    fn rejects_duplicate_tag_keys() {
        let tags = vec![Tag::new("id", "1").unwrap(), Tag::new("id", "2").unwrap()];
        assert!(InputEvent::new("T", tags, serde_json::json!({})).is_err());
    }

    #[test]
    fn cursor_derives_from_transaction_id_and_position() {
        let event = Event {
            event_type: "T".to_string(),
            tags: vec![],
            data: serde_json::json!({}),
            position: 7,
            transaction_id: 3,
            created_at: Utc::now(),
        };
        assert_eq!(event.cursor(), Cursor::new(3, 7));
    }
}
