//! Ordered storage for pending tasks.

use std::collections::BTreeMap;

/// Identifier assigned to every enqueued task.
pub type TaskId = u64;

/// A pending task together with the id it was stored under.
#[derive(Debug)]
pub struct TaskEntry<F> {
    /// Id assigned at insertion.
    pub id: TaskId,
    /// The stored factory.
    pub factory: F,
}

/// Ordered map from a monotonically increasing id to a pending task.
///
/// Ids start at 0 and are never handed out twice for the lifetime of the
/// store, including across [`TaskStore::clear`]. Iteration follows insertion
/// order.
#[derive(Debug)]
pub struct TaskStore<F> {
    entries: BTreeMap<TaskId, F>,
    next_id: TaskId,
}

impl<F> Default for TaskStore<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> TaskStore<F> {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Store a factory under the next id and return that id.
    pub fn insert(&mut self, factory: F) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(id, factory);
        id
    }

    /// Drop the entry for `id`. Returns whether it was present.
    pub fn remove(&mut self, id: TaskId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Remove and return the factory stored under `id`.
    pub fn take(&mut self, id: TaskId) -> Option<F> {
        self.entries.remove(&id)
    }

    /// Remove and return the oldest entry.
    pub fn pop_front(&mut self) -> Option<TaskEntry<F>> {
        self.entries
            .pop_first()
            .map(|(id, factory)| TaskEntry { id, factory })
    }

    /// Remove up to `limit` of the oldest entries.
    pub fn take_batch(&mut self, limit: usize) -> Vec<TaskEntry<F>> {
        let mut batch = Vec::with_capacity(limit.min(self.entries.len()));
        while batch.len() < limit {
            match self.pop_front() {
                Some(entry) => batch.push(entry),
                None => break,
            }
        }
        batch
    }

    /// Remove every entry. The id counter keeps counting.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Id the next insertion will receive.
    pub const fn next_id(&self) -> TaskId {
        self.next_id
    }

    /// Pending ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.entries.keys().copied()
    }

    /// Pending entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (TaskId, &F)> + '_ {
        self.entries.iter().map(|(id, factory)| (*id, factory))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential_from_zero() {
        let mut store = TaskStore::new();
        assert_eq!(store.insert("a"), 0);
        assert_eq!(store.insert("b"), 1);
        assert_eq!(store.insert("c"), 2);
        assert_eq!(store.len(), 3);
        assert_eq!(store.ids().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut store = TaskStore::new();
        let id = store.insert("a");
        assert!(store.remove(id));
        assert!(!store.remove(id));
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear_keeps_counter() {
        let mut store = TaskStore::new();
        store.insert("a");
        store.insert("b");
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        // Ids keep growing so a new task can never collide with one in flight
        assert_eq!(store.insert("c"), 2);
    }

    #[test]
    fn test_ids_not_reused_after_removal() {
        let mut store = TaskStore::new();
        let first = store.insert("a");
        store.remove(first);
        let second = store.insert("b");
        assert_ne!(first, second);
        assert_eq!(store.next_id(), 2);
    }

    #[test]
    fn test_take_batch_oldest_first() {
        let mut store = TaskStore::new();
        for name in ["a", "b", "c", "d"] {
            store.insert(name);
        }
        store.remove(1);

        let batch = store.take_batch(2);
        let taken: Vec<_> = batch.iter().map(|e| (e.id, e.factory)).collect();
        assert_eq!(taken, vec![(0, "a"), (2, "c")]);
        assert_eq!(store.iter().collect::<Vec<_>>(), vec![(3, &"d")]);
    }

    #[test]
    fn test_take_batch_larger_than_store() {
        let mut store = TaskStore::new();
        store.insert(1);
        assert_eq!(store.take_batch(10).len(), 1);
        assert!(store.take_batch(10).is_empty());
        assert!(store.pop_front().is_none());
    }

    #[test]
    fn test_take_returns_factory() {
        let mut store = TaskStore::new();
        let id = store.insert("payload");
        assert_eq!(store.take(id), Some("payload"));
        assert_eq!(store.take(id), None);
    }
}
