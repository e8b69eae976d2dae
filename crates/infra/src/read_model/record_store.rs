use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use thiserror::Error;

/// Write-side storage failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store can no longer accept writes (e.g. a poisoned lock).
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// Key/value store abstraction for records.
///
/// Reads degrade to "nothing found"; writes report failure so callers never
/// acknowledge data that was not stored.
pub trait RecordStore<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Option<V>;
    fn upsert(&self, key: K, value: V) -> Result<(), StoreError>;
    /// Remove a record, returning it if it existed.
    fn remove(&self, key: &K) -> Result<Option<V>, StoreError>;
    fn list(&self) -> Vec<V>;
    /// All records matching `pred` (unordered).
    fn find(&self, pred: &dyn Fn(&V) -> bool) -> Vec<V>;
}

impl<K, V, S> RecordStore<K, V> for Arc<S>
where
    S: RecordStore<K, V> + ?Sized,
{
    fn get(&self, key: &K) -> Option<V> {
        (**self).get(key)
    }

    fn upsert(&self, key: K, value: V) -> Result<(), StoreError> {
        (**self).upsert(key, value)
    }

    fn remove(&self, key: &K) -> Result<Option<V>, StoreError> {
        (**self).remove(key)
    }

    fn list(&self) -> Vec<V> {
        (**self).list()
    }

    fn find(&self, pred: &dyn Fn(&V) -> bool) -> Vec<V> {
        (**self).find(pred)
    }
}

/// In-memory store for tests/dev.
#[derive(Debug)]
pub struct InMemoryRecordStore<K, V> {
    inner: RwLock<HashMap<K, V>>,
}

impl<K, V> InMemoryRecordStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryRecordStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> RecordStore<K, V> for InMemoryRecordStore<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().ok()?;
        map.get(key).cloned()
    }

    fn upsert(&self, key: K, value: V) -> Result<(), StoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        map.insert(key, value);
        Ok(())
    }

    fn remove(&self, key: &K) -> Result<Option<V>, StoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(map.remove(key))
    }

    fn list(&self) -> Vec<V> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        map.values().cloned().collect()
    }

    fn find(&self, pred: &dyn Fn(&V) -> bool) -> Vec<V> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        map.values().filter(|v| pred(v)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_replaces_existing_value() {
        let store = InMemoryRecordStore::<u32, &'static str>::new();
        store.upsert(1, "a").unwrap();
        store.upsert(1, "b").unwrap();
        assert_eq!(store.get(&1), Some("b"));
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn remove_returns_the_old_value_once() {
        let store = InMemoryRecordStore::<u32, u32>::new();
        store.upsert(7, 70).unwrap();
        assert_eq!(store.remove(&7).unwrap(), Some(70));
        assert_eq!(store.remove(&7).unwrap(), None);
        assert_eq!(store.get(&7), None);
    }

    #[test]
    fn find_filters_by_predicate_through_arc() {
        let store = Arc::new(InMemoryRecordStore::<u32, u32>::new());
        for i in 0..10 {
            store.upsert(i, i * 10).unwrap();
        }
        let mut even = store.find(&|v| v % 20 == 0);
        even.sort();
        assert_eq!(even, vec![0, 20, 40, 60, 80]);
    }

    #[test]
    fn writes_fail_loudly_once_the_lock_is_poisoned() {
        let store = Arc::new(InMemoryRecordStore::<u32, u32>::new());
        store.upsert(1, 10).unwrap();

        let poisoner = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.inner.write().unwrap();
            panic!("poison the store");
        })
        .join();

        assert!(matches!(store.upsert(2, 20), Err(StoreError::Unavailable(_))));
        assert!(matches!(store.remove(&1), Err(StoreError::Unavailable(_))));
    }
}
