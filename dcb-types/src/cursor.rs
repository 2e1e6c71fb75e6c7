//! Cursor
//!
//! A gap-free resume point in the log: `(transaction_id, position)`. A
//! single `position` column is not enough, because under MVCC a
//! lower-position event can become visible *after* a higher-position one
//! committed earlier (two transactions interleaving). Comparing the pair
//! restores a total order that matches commit order exactly.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A resume point: the commit identifier of the transaction that wrote an
/// event, paired with that event's position within the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Commit identifier of the transaction that inserted the event.
    pub transaction_id: i64,
    /// The event's position within the log.
    pub position: i64,
}

impl Cursor {
    /// Construct a cursor.
    pub fn new(transaction_id: i64, position: i64) -> Self {
        Self {
            transaction_id,
            position,
        }
    }

    /// Is `self` strictly after `other` in cursor order?
    pub fn is_after(&self, other: &Cursor) -> bool {
        self.cmp(other) == Ordering::Greater
    }
}

impl Ord for Cursor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.transaction_id
            .cmp(&other.transaction_id)
            .then_with(|| self.position.cmp(&other.position))
    }
}

impl PartialOrd for Cursor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compares_by_transaction_id_first() {
        let a = Cursor::new(1, 100);
        let b = Cursor::new(2, 1);
        assert!(a < b, "later transaction wins regardless of position");
    }

    #[test]
    fn compares_by_position_within_same_transaction() {
        let a = Cursor::new(5, 1);
        let b = Cursor::new(5, 2);
        assert!(a < b);
        assert!(b.is_after(&a));
    }

    #[test]
    fn equal_cursors_are_neither_after_the_other() {
        let a = Cursor::new(5, 1);
        let b = Cursor::new(5, 1);
        assert_eq!(a, b);
        assert!(!a.is_after(&b));
    }

    #[test]
    fn total_order_resolves_lower_position_committed_later() {
        // A lower-position event e1 that commits in a *later* transaction
        // than a higher-position event e2 must still sort after e2.
        let e1 = Cursor::new(10, 5);
        let e2 = Cursor::new(9, 50);
        assert!(e1.is_after(&e2));
    }
}
