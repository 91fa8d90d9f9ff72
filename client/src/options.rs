use js_sys::{Array, Object, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use restoremap_shared::{LayerConfig, OverlayEntry, RestoreOptions};

/// Own enumerable `(key, value)` pairs of a plain JS object.
pub fn entries(value: &JsValue) -> Vec<(String, JsValue)> {
    if !value.is_object() {
        return Vec::new();
    }
    Object::entries(value.unchecked_ref())
        .iter()
        .filter_map(|entry| {
            let pair = entry.dyn_into::<Array>().ok()?;
            Some((pair.get(0).as_string()?, pair.get(1)))
        })
        .collect()
}

// Leaflet layers inherit `addTo`; plain group objects do not.
fn is_layer(value: &JsValue) -> bool {
    value.is_object() && Reflect::has(value, &JsValue::from_str("addTo")).unwrap_or(false)
}

fn field(options: &JsValue, key: &str) -> JsValue {
    Reflect::get(options, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}

/// Split JS options into plain settings and the layer handles they name.
pub fn parse(options: &JsValue) -> (RestoreOptions, LayerConfig<JsValue>) {
    if !options.is_object() {
        return (RestoreOptions::default(), LayerConfig::default());
    }

    let settings = serde_wasm_bindgen::from_value::<RestoreOptions>(options.clone())
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "invalid restoreMap options; using defaults");
            RestoreOptions::default()
        });

    let mut layers = LayerConfig::default();
    for (name, layer) in entries(&field(options, "baseLayers")) {
        layers.base_layers.insert(name, layer);
    }
    for (name, value) in entries(&field(options, "overlays")) {
        if is_layer(&value) {
            layers.overlays.insert(name, OverlayEntry::Layer(value));
        } else if value.is_object() {
            let group = entries(&value).into_iter().collect();
            layers.overlays.insert(name, OverlayEntry::Group(group));
        } else {
            tracing::debug!(%name, "skipping overlay that is not a layer or group");
        }
    }
    (settings, layers)
}
