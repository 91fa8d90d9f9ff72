use serde::Deserialize;

/// Storage key holding the layers document.
pub const LAYERS_KEY: &str = "mapLayers";
/// Storage key holding the view document.
pub const VIEW_KEY: &str = "mapView";

pub const DEFAULT_ID: &str = "shared";
pub const DEFAULT_SCOPE: &str = "global";
/// Layers bucket id used by every map constructed with `share_layers`.
pub const SHARED_LAYERS_ID: &str = "shared";

/// Which browser store backs a settings category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Survives across browser sessions (`localStorage`).
    Local,
    /// Cleared when the browsing session ends (`sessionStorage`).
    Session,
}

/// Plain options accepted at attach time. Layer handles are passed separately
/// since they belong to the host widget.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RestoreOptions {
    pub id: String,
    pub scope: String,
    pub share_layers: bool,
    pub layer_storage_type: StorageKind,
    pub view_storage_type: StorageKind,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            id: DEFAULT_ID.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            share_layers: false,
            layer_storage_type: StorageKind::Local,
            view_storage_type: StorageKind::Session,
        }
    }
}

impl RestoreOptions {
    pub fn keys(&self) -> SettingsKeys {
        let layers_id = if self.share_layers {
            SHARED_LAYERS_ID.to_string()
        } else {
            self.id.clone()
        };
        SettingsKeys {
            scope: self.scope.clone(),
            layers_id,
            view_id: self.id.clone(),
        }
    }
}

/// Resolved bucket coordinates for one synchronizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsKeys {
    pub scope: String,
    pub layers_id: String,
    pub view_id: String,
}
