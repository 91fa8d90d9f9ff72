pub mod config;
pub mod error;
pub mod layers;
pub mod map;
pub mod restore;
pub mod settings;
pub mod storage;
#[cfg(test)]
mod testing;

pub use config::{RestoreOptions, SettingsKeys, StorageKind};
pub use error::{RestoreError, StorageError};
pub use layers::{LayerConfig, OverlayEntry};
pub use map::{LatLng, Listener, MapEvent, MapWidget};
pub use restore::{MapRestore, RestoreHandle};
pub use settings::*;
pub use storage::{KeyValueStore, MemoryStore, Stores};
