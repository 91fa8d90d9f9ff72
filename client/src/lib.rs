//! Browser bindings for restoring Leaflet map state from Web Storage.

mod leaflet;
mod logging;
mod options;
mod storage;

use wasm_bindgen::prelude::*;

use restoremap_shared::{MapRestore, RestoreHandle};

use crate::leaflet::LeafletMap;
pub use crate::leaflet::Map;

/// Returned by `restoreMap`; reconfigures the tracked overlays.
#[wasm_bindgen]
pub struct RestoreMapHandle {
    map: LeafletMap,
    handle: RestoreHandle<LeafletMap>,
}

#[wasm_bindgen]
impl RestoreMapHandle {
    /// Track the overlays in a `{ name: layer }` object and apply their stored state.
    #[wasm_bindgen(js_name = addOverlay)]
    pub fn add_overlay(&mut self, overlay: JsValue) {
        for (name, layer) in options::entries(&overlay) {
            self.handle.add_overlay(&mut self.map, name, layer);
        }
    }

    /// Stop tracking the overlays named by a `{ name: layer }` object.
    #[wasm_bindgen(js_name = removeOverlay)]
    pub fn remove_overlay(&mut self, overlay: JsValue) {
        for (name, _) in options::entries(&overlay) {
            if !self.handle.remove_overlay(&mut self.map, &name) {
                tracing::debug!(%name, "overlay was not tracked");
            }
        }
    }
}

/// Restore the stored state of `map` and keep recording its changes.
#[wasm_bindgen(js_name = restoreMap)]
pub fn restore_map(map: Map, options: JsValue) -> RestoreMapHandle {
    console_error_panic_hook::set_once();
    logging::init(None);
    let (settings, layers) = options::parse(&options);
    let mut map = LeafletMap::new(map);
    let handle = MapRestore::attach(&mut map, &settings, layers, &storage::browser_stores());
    RestoreMapHandle { map, handle }
}

/// Change the console log filter to an `EnvFilter` directive such as
/// `"restoremap_shared=debug"`. `restoreMap` installs the console logger
/// at the default `info` level on its own.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(filter: Option<String>) {
    logging::init(filter.as_deref());
}
