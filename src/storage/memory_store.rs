use std::collections::HashMap;
use std::sync::Mutex;

use crate::storage::key_value::{validate_key, KeyValueStore, StorageError};

/// In-memory store, used by tests and for runs with no storage directory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects writes once the stored values would exceed `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut entries = self.lock();

        if let Some(quota) = self.quota_bytes {
            let used: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let available = quota.saturating_sub(used);
            if value.len() > available {
                return Err(StorageError::QuotaExceeded {
                    needed: value.len(),
                    available,
                });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let store = InMemoryStore::new();
        store.set("cart.office.guest", "[]").unwrap();
        assert_eq!(store.get("cart.office.guest").unwrap().as_deref(), Some("[]"));

        store.remove("cart.office.guest").unwrap();
        assert!(store.get("cart.office.guest").unwrap().is_none());
        // removing again is fine
        store.remove("cart.office.guest").unwrap();
    }

    #[test]
    fn test_quota_exceeded() {
        let store = InMemoryStore::with_quota(8);
        store.set("a", "1234").unwrap();
        let result = store.set("b", "123456");
        assert!(matches!(result, Err(StorageError::QuotaExceeded { needed: 6, available: 4 })));

        // overwriting an existing key frees its old size first
        store.set("a", "12345678").unwrap();
    }
}
