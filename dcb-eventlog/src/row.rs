//! Physical row shape of the `events` table.

use chrono::{DateTime, Utc};
use dcb_types::{tag, Event};

/// Database row mapping for one event. `type` is a reserved word in Rust,
/// so the field is named `event_type` and renamed back at the column level.
#[derive(Debug, sqlx::FromRow)]
pub struct EventRow {
    #[sqlx(rename = "type")]
    pub event_type: String,
    pub tags: Vec<String>,
    pub data: serde_json::Value,
    pub position: i64,
    pub transaction_id: i64,
    pub created_at: DateTime<Utc>,
}

impl EventRow {
    /// Decode the row's canonical tag strings and assemble a domain `Event`.
    pub fn into_event(self) -> dcb_types::Result<Event> {
        Ok(Event {
            event_type: self.event_type,
            tags: tag::decode(&self.tags)?,
            data: self.data,
            position: self.position,
            transaction_id: self.transaction_id,
            created_at: self.created_at,
        })
    }
}
