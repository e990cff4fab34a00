//! In-memory keyed storage scoped to a flow
//!
//! Values are arbitrary tokens. Every change is announced synchronously to the
//! registered listeners after the table lock has been released, so a listener
//! may read the storage it is listening to.

use std::{collections::BTreeMap, fmt, sync::Arc};

use parking_lot::RwLock;
use tracing::{Level, event};
use uuid::Uuid;

use crate::domain::{
    constant::storage,
    error::{FlowError, Result},
    value::Token,
    variable::is_valid_name
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageChangeType {
    Added,
    Updated,
    Deleted,
    Cleared
}

/// Notification sent to storage listeners
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChangeEvent {
    pub change: StorageChangeType,
    /// Affected key, absent for `Cleared`
    pub key:    Option<String>
}

pub type StorageListener = Arc<dyn Fn(&StorageChangeEvent) + Send + Sync>;

/// Shared handle to the storage table; clones share the same table
#[derive(Clone, Default)]
pub struct Storage {
    items:     Arc<RwLock<BTreeMap<String, Token>>>,
    listeners: Arc<RwLock<Vec<(Uuid, StorageListener)>>>
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("keys", &self.keys())
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the value, replacing any previous value under the key
    pub fn set(&self, key: &str, value: Token) -> Result<()> {
        check_key(key)?;
        let previous = self.items.write().insert(key.to_string(), value);
        let change = if previous.is_some() { StorageChangeType::Updated } else { StorageChangeType::Added };
        self.notify(StorageChangeEvent { change, key: Some(key.to_string()) });
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<Token>> {
        check_key(key)?;
        Ok(self.items.read().get(key).cloned())
    }

    pub fn has(&self, key: &str) -> Result<bool> {
        check_key(key)?;
        Ok(self.items.read().contains_key(key))
    }

    pub fn remove(&self, key: &str) -> Result<Option<Token>> {
        check_key(key)?;
        let removed = self.items.write().remove(key);
        if removed.is_some() {
            self.notify(StorageChangeEvent { change: StorageChangeType::Deleted, key: Some(key.to_string()) });
        }
        Ok(removed)
    }

    pub fn clear(&self) {
        self.items.write().clear();
        self.notify(StorageChangeEvent { change: StorageChangeType::Cleared, key: None });
    }

    pub fn keys(&self) -> Vec<String> {
        self.items.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Registers a listener and returns the id needed to remove it again
    pub fn add_listener<F>(&self, listener: F) -> Uuid
    where
        F: Fn(&StorageChangeEvent) + Send + Sync + 'static
    {
        let id = Uuid::new_v4();
        self.listeners.write().push((id, Arc::new(listener)));
        id
    }

    pub fn remove_listener(&self, id: Uuid) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    fn notify(&self, change: StorageChangeEvent) {
        let name = match change.change {
            StorageChangeType::Added => storage::ITEM_ADDED,
            StorageChangeType::Updated => storage::ITEM_UPDATED,
            StorageChangeType::Deleted => storage::ITEM_DELETED,
            StorageChangeType::Cleared => storage::CLEARED
        };
        event!(Level::TRACE, event = name, key = ?change.key);

        let listeners: Vec<StorageListener> = self.listeners.read().iter().map(|(_, l)| Arc::clone(l)).collect();
        for listener in listeners {
            listener(&change);
        }
    }
}

fn check_key(key: &str) -> Result<()> {
    if is_valid_name(key) { Ok(()) } else { Err(FlowError::invalid_storage_name(key)) }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    #[test]
    fn test_invalid_key_is_an_error() {
        let storage = Storage::new();
        assert!(matches!(storage.set("a.b", json!(1)), Err(FlowError::InvalidName(_))));
        assert!(storage.is_empty());

        storage.set("a", json!(1)).unwrap();
        assert!(matches!(storage.get("a.b"), Err(FlowError::InvalidName(_))));
        assert!(matches!(storage.has("a b"), Err(FlowError::InvalidName(_))));
        assert!(matches!(storage.remove("x/y"), Err(FlowError::InvalidName(_))));
        assert!(storage.has("a").unwrap());
        assert_eq!(storage.get("a").unwrap(), Some(json!(1)));
    }

    #[test]
    fn test_listeners_see_every_change() {
        let storage = Storage::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = storage.add_listener(move |e| sink.lock().unwrap().push(e.change));

        storage.set("a", json!(1)).unwrap();
        storage.set("a", json!(2)).unwrap();
        assert_eq!(storage.remove("a").unwrap(), Some(json!(2)));
        assert_eq!(storage.remove("a").unwrap(), None);
        storage.clear();

        assert_eq!(*seen.lock().unwrap(), vec![
            StorageChangeType::Added,
            StorageChangeType::Updated,
            StorageChangeType::Deleted,
            StorageChangeType::Cleared
        ]);

        assert!(storage.remove_listener(id));
        assert!(!storage.remove_listener(id));
        storage.set("b", json!("x")).unwrap();
        assert_eq!(seen.lock().unwrap().len(), 4);
    }

    #[test]
    fn test_listener_can_read_storage() {
        let storage = Storage::new();
        let reader = storage.clone();
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        storage.add_listener(move |e| {
            if let Some(key) = &e.key {
                *sink.lock().unwrap() = reader.get(key).unwrap();
            }
        });
        storage.set("k", json!([1, 2])).unwrap();
        assert_eq!(*seen.lock().unwrap(), Some(json!([1, 2])));
    }
}
