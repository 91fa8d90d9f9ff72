use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::StorageKind;
use crate::error::{RestoreError, StorageError};
use crate::settings::SettingsDocument;

/// Synchronous string key-value store, the shape of browser Web Storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory store. Stands in for a browser store that is unavailable.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    items: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(self, key: &str, value: &str) -> Self {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// The durable and session-scoped backends a synchronizer can pick from.
#[derive(Clone)]
pub struct Stores {
    pub local: Rc<dyn KeyValueStore>,
    pub session: Rc<dyn KeyValueStore>,
}

impl Stores {
    pub fn new(local: Rc<dyn KeyValueStore>, session: Rc<dyn KeyValueStore>) -> Self {
        Self { local, session }
    }

    /// Two independent in-memory stores.
    pub fn in_memory() -> Self {
        Self::new(Rc::new(MemoryStore::new()), Rc::new(MemoryStore::new()))
    }

    pub fn get(&self, kind: StorageKind) -> Rc<dyn KeyValueStore> {
        match kind {
            StorageKind::Local => Rc::clone(&self.local),
            StorageKind::Session => Rc::clone(&self.session),
        }
    }
}

/// Read a settings document. A missing key is an empty document.
pub fn load_document<T>(
    store: &dyn KeyValueStore,
    key: &'static str,
) -> Result<SettingsDocument<T>, RestoreError>
where
    T: Default + Serialize + DeserializeOwned,
{
    match store.get(key) {
        Some(raw) => {
            SettingsDocument::from_json(&raw).map_err(|source| RestoreError::Decode { key, source })
        }
        None => Ok(SettingsDocument::default()),
    }
}

/// Overwrite a settings document in full.
pub fn save_document<T>(
    store: &dyn KeyValueStore,
    key: &'static str,
    doc: &SettingsDocument<T>,
) -> Result<(), RestoreError>
where
    T: Default + Serialize + DeserializeOwned,
{
    let raw = doc.to_json()?;
    store.set(key, &raw)?;
    Ok(())
}
