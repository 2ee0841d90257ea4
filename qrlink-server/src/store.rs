//! # Record store
//!
//! In-memory key/value store owned by a service and shared with its handlers. Single-key
//! operations are atomic; nothing survives a restart.
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Length of generated keys.
pub const KEY_LENGTH: usize = 6;

/// How many fresh keys are tried before giving up.
pub const MAX_KEY_ATTEMPTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("No free key found after {attempts} attempts")]
pub struct KeySpaceExhausted {
    pub attempts: usize,
}

/// A random key: a v4 UUID, URL-safe base64 encoded, truncated to [`KEY_LENGTH`] characters.
pub fn generate_key() -> String {
    let id = uuid::Uuid::new_v4();
    let mut key = URL_SAFE_NO_PAD.encode(id.as_bytes());
    key.truncate(KEY_LENGTH);
    key
}

#[derive(Debug)]
pub struct RecordStore<V> {
    records: DashMap<String, V>,
}

impl<V> Default for RecordStore<V> {
    fn default() -> Self {
        Self {
            records: DashMap::new(),
        }
    }
}

impl<V: Clone> RecordStore<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn put(&self, key: impl Into<String>, value: V) -> Option<V> {
        self.records.insert(key.into(), value)
    }

    pub fn lookup(&self, key: &str) -> Option<V> {
        self.records.get(key).map(|entry| entry.value().clone())
    }

    /// Stores `value` only if `key` is free.
    pub fn insert_new(&self, key: impl Into<String>, value: V) -> bool {
        match self.records.entry(key.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
        }
    }

    /// Stores the value built by `make` under a freshly generated key.
    pub fn insert_fresh(&self, make: impl Fn(&str) -> V) -> Result<V, KeySpaceExhausted> {
        self.insert_fresh_with(generate_key, make)
    }

    /// Same as [`RecordStore::insert_fresh`] with a custom key generator.
    ///
    /// Keys already in use are regenerated, up to [`MAX_KEY_ATTEMPTS`] times.
    pub fn insert_fresh_with(
        &self,
        mut next_key: impl FnMut() -> String,
        make: impl Fn(&str) -> V,
    ) -> Result<V, KeySpaceExhausted> {
        for attempt in 1..=MAX_KEY_ATTEMPTS {
            let key = next_key();
            if let Entry::Vacant(slot) = self.records.entry(key) {
                let value = make(slot.key());
                slot.insert(value.clone());
                return Ok(value);
            }
            tracing::debug!(attempt, "generated key already in use, retrying");
        }
        Err(KeySpaceExhausted {
            attempts: MAX_KEY_ATTEMPTS,
        })
    }

    pub fn remove(&self, key: &str) -> Option<V> {
        self.records.remove(key).map(|(_, value)| value)
    }

    /// Applies `change` to the value under `key` and returns the updated value.
    pub fn update(&self, key: &str, change: impl FnOnce(&mut V)) -> Option<V> {
        let mut entry = self.records.get_mut(key)?;
        change(entry.value_mut());
        Some(entry.value().clone())
    }

    pub fn values(&self) -> Vec<V> {
        self.records
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<V: Clone + Default> RecordStore<V> {
    /// Value under `key`, or the default value when there is none.
    pub fn get(&self, key: &str) -> V {
        self.lookup(key).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn get_falls_back_to_default() {
        let store = RecordStore::new();
        store.put("abc123", "https://example.com".to_string());

        assert_eq!(store.get("abc123"), "https://example.com");
        assert_eq!(store.get("unknown"), "");
        assert_eq!(store.lookup("unknown"), None);
    }

    #[test]
    fn put_overwrites_but_insert_new_does_not() {
        let store = RecordStore::new();
        assert!(store.insert_new("k", 1));
        assert!(!store.insert_new("k", 2));
        assert_eq!(store.get("k"), 1);

        assert_eq!(store.put("k", 3), Some(1));
        assert_eq!(store.get("k"), 3);
    }

    #[test]
    fn generated_keys_are_url_safe() {
        for _ in 0..200 {
            let key = generate_key();
            assert_eq!(key.len(), KEY_LENGTH);
            let url_safe = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';
            assert!(key.chars().all(url_safe));
        }
    }

    #[test]
    fn colliding_keys_are_regenerated() {
        let store = RecordStore::new();
        store.put("taken0", "first".to_string());

        let mut keys = vec!["fresh1", "taken0"];
        let value = store
            .insert_fresh_with(
                || keys.pop().unwrap().to_string(),
                |key| format!("value of {key}"),
            )
            .unwrap();

        assert_eq!(value, "value of fresh1");
        assert_eq!(store.get("taken0"), "first");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn exhausted_key_space_is_reported() {
        let store = RecordStore::new();
        store.put("always", 0u32);

        let err = store
            .insert_fresh_with(|| "always".to_string(), |_| 1)
            .unwrap_err();
        assert_eq!(err.attempts, MAX_KEY_ATTEMPTS);
        assert_eq!(store.get("always"), 0);
    }

    #[test]
    fn update_and_remove() {
        let store = RecordStore::new();
        store.put("k", 1u64);

        assert_eq!(store.update("k", |v| *v += 1), Some(2));
        assert_eq!(store.update("missing", |v| *v += 1), None);
        assert_eq!(store.remove("k"), Some(2));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn concurrent_updates_are_not_lost() {
        let store = Arc::new(RecordStore::new());
        store.put("clicks", 0u64);

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store.update("clicks", |v| *v += 1);
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(store.get("clicks"), 50);
    }
}
