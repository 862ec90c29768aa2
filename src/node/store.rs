//! In-memory key-value store
//!
//! Each node owns exactly one `Store`, shared by every request handler through
//! an `Arc`. A `RwLock` serializes access: `get`/`snapshot` run concurrently with
//! each other, `set`/`merge` exclude everything else for their duration.
//!
//! Writes are last-applied-wins with no versioning. Two nodes receiving
//! concurrent writes to the same key in different orders keep different values
//! forever; nothing here reconciles them.

use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Point-in-time copy of a store, ordered by key.
pub type Snapshot = BTreeMap<String, String>;

#[derive(Default)]
struct Inner {
    entries: HashMap<String, String>,
    /// Number of times a write was applied per key
    writes: HashMap<String, u64>,
}

impl Inner {
    fn apply(&mut self, key: String, value: String) {
        *self.writes.entry(key.clone()).or_insert(0) += 1;
        self.entries.insert(key, value);
    }
}

#[derive(Default)]
pub struct Store {
    inner: RwLock<Inner>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave a half-written entry
    // (insert is the last step), so a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current value for `key`, `None` if it was never set.
    pub fn get(&self, key: &str) -> Option<String> {
        self.read().entries.get(key).cloned()
    }

    /// Insert or overwrite unconditionally.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.write().apply(key.into(), value.into());
    }

    /// Apply every entry of a peer snapshot under a single write lock.
    ///
    /// Returns the number of entries applied.
    pub fn merge(&self, snapshot: Snapshot) -> usize {
        let mut inner = self.write();
        let count = snapshot.len();
        for (key, value) in snapshot {
            inner.apply(key, value);
        }
        count
    }

    pub fn snapshot(&self) -> Snapshot {
        self.read()
            .entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// How many writes were applied locally for `key`.
    pub fn write_count(&self, key: &str) -> u64 {
        self.read().writes.get(key).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_get_unset_key() {
        let store = Store::new();
        assert_eq!(store.get("missing"), None);
        assert_eq!(store.write_count("missing"), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_then_get() {
        let store = Store::new();
        store.set("a", "1");
        assert_eq!(store.get("a").as_deref(), Some("1"));

        store.set("a", "2");
        assert_eq!(store.get("a").as_deref(), Some("2"));
        assert_eq!(store.write_count("a"), 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_repeated_set_is_idempotent() {
        let store = Store::new();
        store.set("k", "v");
        let first = store.snapshot();
        store.set("k", "v");
        store.set("k", "v");
        assert_eq!(store.snapshot(), first);
    }

    #[test]
    fn test_merge_overwrites() {
        let store = Store::new();
        store.set("x", "old");
        store.set("keep", "1");

        let mut incoming = Snapshot::new();
        incoming.insert("x".into(), "new".into());
        incoming.insert("y".into(), "2".into());
        assert_eq!(store.merge(incoming), 2);

        let snap = store.snapshot();
        assert_eq!(snap.len(), 3);
        assert_eq!(snap["x"], "new");
        assert_eq!(snap["y"], "2");
        assert_eq!(snap["keep"], "1");
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let store = Store::new();
        store.set("a", "1");
        let snap = store.snapshot();
        store.set("a", "2");
        assert_eq!(snap["a"], "1");
    }

    #[test]
    fn test_concurrent_writers_leave_one_value() {
        let store = Arc::new(Store::new());
        let values: Vec<String> = (0..32).map(|i| format!("value{}", i)).collect();

        let handles: Vec<_> = values
            .iter()
            .cloned()
            .map(|v| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        store.set("k", v.clone());
                        let _ = store.get("k");
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let last = store.get("k").unwrap();
        assert!(values.contains(&last));
        assert_eq!(store.write_count("k"), 32 * 100);
        assert_eq!(store.len(), 1);
    }
}
