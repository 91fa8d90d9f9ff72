use std::marker::PhantomData;
use std::rc::Rc;

use gloo_storage::{LocalStorage, SessionStorage, Storage};
use restoremap_shared::{KeyValueStore, MemoryStore, StorageError, StorageKind, Stores};

/// Web Storage backend; `S` selects `localStorage` or `sessionStorage`.
pub struct WebStore<S> {
    _backend: PhantomData<S>,
}

impl<S: Storage> WebStore<S> {
    fn new() -> Self {
        Self {
            _backend: PhantomData,
        }
    }
}

impl<S: Storage> KeyValueStore for WebStore<S> {
    fn get(&self, key: &str) -> Option<String> {
        S::raw().get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        S::raw()
            .set_item(key, value)
            .map_err(|e| StorageError::Write(format!("{e:?}")))
    }
}

// gloo's `raw()` panics without a store, so probe through web-sys first.
fn available(kind: StorageKind) -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    let storage = match kind {
        StorageKind::Local => window.local_storage(),
        StorageKind::Session => window.session_storage(),
    };
    matches!(storage, Ok(Some(_)))
}

fn store<S: Storage + 'static>(kind: StorageKind) -> Rc<dyn KeyValueStore> {
    if available(kind) {
        Rc::new(WebStore::<S>::new())
    } else {
        tracing::debug!(?kind, "web storage unavailable; keeping map settings in memory");
        Rc::new(MemoryStore::new())
    }
}

/// Browser stores, with in-memory stand-ins for any that are blocked.
pub fn browser_stores() -> Stores {
    Stores::new(
        store::<LocalStorage>(StorageKind::Local),
        store::<SessionStorage>(StorageKind::Session),
    )
}
