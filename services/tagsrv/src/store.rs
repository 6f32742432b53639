//! Current-value store
//!
//! One slot per catalog entry, positional correspondence. Written only by the
//! batch poller after a successful fetch, or by the tag writer immediately
//! after a successful write. The single control thread makes explicit
//! synchronization unnecessary.

use chrono::{DateTime, Utc};

/// A decoded engineering value and when it was stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagValue {
    /// Engineering value; booleans are 0.0 / 1.0
    pub value: f64,
    /// Time the value was stored (poll decode or optimistic write)
    pub updated_at: DateTime<Utc>,
}

/// Positional store of last-known tag values.
#[derive(Debug, Clone)]
pub struct CurrentValueStore {
    values: Vec<Option<TagValue>>,
}

impl CurrentValueStore {
    pub fn new(len: usize) -> Self {
        Self {
            values: vec![None; len],
        }
    }

    pub fn set(&mut self, index: usize, value: f64) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = Some(TagValue {
                value,
                updated_at: Utc::now(),
            });
        }
    }

    pub fn get(&self, index: usize) -> Option<TagValue> {
        self.values.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Snapshot of all slots, positional.
    pub fn snapshot(&self) -> Vec<Option<TagValue>> {
        self.values.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_positional() {
        let mut store = CurrentValueStore::new(3);
        assert_eq!(store.get(1), None);
        store.set(1, 42.5);
        assert_eq!(store.get(1).unwrap().value, 42.5);
        assert_eq!(store.get(0), None);
    }

    #[test]
    fn out_of_range_set_is_a_no_op() {
        let mut store = CurrentValueStore::new(1);
        store.set(5, 1.0);
        assert_eq!(store.len(), 1);
    }
}
