use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Object, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use restoremap_shared::{LatLng, Listener, MapEvent, MapWidget};

/// Property set on the Leaflet map once restore listeners are registered.
const LISTENER_MARKER: &str = "__initRestore";

#[wasm_bindgen]
extern "C" {
    /// A Leaflet `L.Map` instance.
    #[derive(Debug, Clone)]
    pub type Map;

    #[wasm_bindgen(method, js_name = getCenter)]
    fn get_center(this: &Map) -> JsLatLng;

    #[wasm_bindgen(method, js_name = getZoom)]
    fn get_zoom(this: &Map) -> f64;

    #[wasm_bindgen(method, js_name = setView)]
    fn set_view(this: &Map, center: &Array, zoom: f64, options: &Object) -> Map;

    #[wasm_bindgen(method, js_name = addLayer)]
    fn add_layer(this: &Map, layer: &JsValue) -> Map;

    #[wasm_bindgen(method, js_name = removeLayer)]
    fn remove_layer(this: &Map, layer: &JsValue) -> Map;

    #[wasm_bindgen(method, js_name = hasLayer)]
    fn has_layer(this: &Map, layer: &JsValue) -> bool;

    // Provided by the Leaflet.fullscreen plugin, which may be absent.
    #[wasm_bindgen(method, catch, js_name = isFullscreen)]
    fn is_fullscreen(this: &Map) -> Result<bool, JsValue>;

    #[wasm_bindgen(method, catch, js_name = toggleFullscreen)]
    fn toggle_fullscreen(this: &Map) -> Result<(), JsValue>;

    #[wasm_bindgen(method)]
    fn on(this: &Map, kind: &str, handler: &js_sys::Function) -> Map;

    type JsLatLng;

    #[wasm_bindgen(method, getter)]
    fn lat(this: &JsLatLng) -> f64;

    #[wasm_bindgen(method, getter)]
    fn lng(this: &JsLatLng) -> f64;
}

fn property(target: &JsValue, key: &str) -> Option<JsValue> {
    if !target.is_object() {
        return None;
    }
    Reflect::get(target, &JsValue::from_str(key)).ok()
}

/// `MapWidget` over a Leaflet map. Layer handles are the Leaflet layer objects.
#[derive(Debug, Clone)]
pub struct LeafletMap {
    map: Map,
}

impl LeafletMap {
    pub fn new(map: Map) -> Self {
        Self { map }
    }
}

impl MapWidget for LeafletMap {
    type Layer = JsValue;

    fn center(&self) -> LatLng {
        let center = self.map.get_center();
        LatLng::new(center.lat(), center.lng())
    }

    fn zoom(&self) -> f64 {
        self.map.get_zoom()
    }

    fn set_view(&mut self, center: LatLng, zoom: f64, animate: bool) {
        let latlng = Array::of2(&center.lat.into(), &center.lng.into());
        let options = Object::new();
        if !animate {
            let _ = Reflect::set(&options, &"reset".into(), &JsValue::TRUE);
            let _ = Reflect::set(&options, &"animate".into(), &JsValue::FALSE);
        }
        self.map.set_view(&latlng, zoom, &options);
    }

    fn is_loaded(&self) -> bool {
        property(&self.map, "_loaded")
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }

    fn is_fullscreen(&self) -> bool {
        self.map.is_fullscreen().unwrap_or(false)
    }

    fn toggle_fullscreen(&mut self) {
        if let Err(e) = self.map.toggle_fullscreen() {
            tracing::debug!(error = ?e, "map has no fullscreen support");
        }
    }

    fn add_layer(&mut self, layer: &JsValue) {
        self.map.add_layer(layer);
    }

    fn remove_layer(&mut self, layer: &JsValue) {
        self.map.remove_layer(layer);
    }

    fn has_layer(&self, layer: &JsValue) -> bool {
        self.map.has_layer(layer)
    }

    fn restore_listeners_attached(&self) -> bool {
        property(&self.map, LISTENER_MARKER)
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }

    fn mark_restore_listeners_attached(&mut self) {
        let _ = Reflect::set(&self.map, &LISTENER_MARKER.into(), &JsValue::TRUE);
    }

    fn subscribe(&mut self, listener: Listener<Self>) {
        let listener = Rc::new(RefCell::new(listener));
        for kind in MapEvent::NAMES {
            let listener = Rc::clone(&listener);
            let map = self.clone();
            let handler = Closure::<dyn FnMut(JsValue)>::new(move |e: JsValue| {
                let Some(event) = to_map_event(kind, &e) else {
                    return;
                };
                if let Ok(mut listener) = listener.try_borrow_mut() {
                    let listener = &mut *listener;
                    listener(&map, &event);
                }
            });
            self.map.on(kind, handler.as_ref().unchecked_ref());
            // Listeners live as long as the map; Leaflet holds the only reference.
            handler.forget();
        }
    }
}

fn to_map_event(kind: &str, e: &JsValue) -> Option<MapEvent> {
    let name = || property(e, "name")?.as_string();
    match kind {
        "baselayerchange" => Some(MapEvent::BaseLayerChange { name: name()? }),
        "fullscreenchange" => Some(MapEvent::FullscreenChange),
        "moveend" => Some(MapEvent::MoveEnd),
        "overlayadd" => Some(MapEvent::OverlayAdd {
            name: name()?,
            group: group_name(e),
        }),
        "overlayremove" => Some(MapEvent::OverlayRemove {
            name: name()?,
            group: group_name(e),
        }),
        _ => None,
    }
}

// Grouped layer controls attach `{ name, ... }` as `e.group`.
fn group_name(e: &JsValue) -> Option<String> {
    property(&property(e, "group")?, "name")?
        .as_string()
        .filter(|name| !name.is_empty())
}
