use std::collections::BTreeSet;

use crate::map::{LatLng, Listener, MapEvent, MapWidget};

/// Scriptable in-process map widget. Layer handles double as overlay names.
pub struct FakeMap {
    pub center: LatLng,
    pub zoom: f64,
    pub loaded: bool,
    pub fullscreen: bool,
    pub active: BTreeSet<&'static str>,
    pub set_view_calls: Vec<(LatLng, f64, bool)>,
    pub fullscreen_toggles: usize,
    /// Fire `overlayadd`/`overlayremove` from inside `add_layer`/`remove_layer`,
    /// the way a layers control echoes programmatic changes.
    pub echo_layer_events: bool,
    pub attached: bool,
    pub listeners: Vec<Listener<FakeMap>>,
}

impl Default for FakeMap {
    fn default() -> Self {
        Self {
            center: LatLng::new(0.0, 0.0),
            zoom: 0.0,
            loaded: true,
            fullscreen: false,
            active: BTreeSet::new(),
            set_view_calls: Vec::new(),
            fullscreen_toggles: 0,
            echo_layer_events: false,
            attached: false,
            listeners: Vec::new(),
        }
    }
}

impl FakeMap {
    pub fn with_active(layers: &[&'static str]) -> Self {
        Self {
            active: layers.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn fire(&mut self, event: MapEvent) {
        let mut listeners = std::mem::take(&mut self.listeners);
        for listener in &mut listeners {
            listener(self, &event);
        }
        listeners.append(&mut self.listeners);
        self.listeners = listeners;
    }

    pub fn overlay_added(&mut self, name: &str) {
        self.fire(MapEvent::OverlayAdd {
            name: name.to_string(),
            group: None,
        });
    }

    pub fn overlay_removed(&mut self, name: &str) {
        self.fire(MapEvent::OverlayRemove {
            name: name.to_string(),
            group: None,
        });
    }

    pub fn move_to(&mut self, lat: f64, lng: f64, zoom: f64) {
        self.center = LatLng::new(lat, lng);
        self.zoom = zoom;
        self.fire(MapEvent::MoveEnd);
    }
}

impl MapWidget for FakeMap {
    type Layer = &'static str;

    fn center(&self) -> LatLng {
        self.center
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn set_view(&mut self, center: LatLng, zoom: f64, animate: bool) {
        self.center = center;
        self.zoom = zoom;
        self.set_view_calls.push((center, zoom, animate));
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    fn toggle_fullscreen(&mut self) {
        self.fullscreen = !self.fullscreen;
        self.fullscreen_toggles += 1;
    }

    fn add_layer(&mut self, layer: &Self::Layer) {
        if self.active.insert(*layer) && self.echo_layer_events {
            self.overlay_added(layer);
        }
    }

    fn remove_layer(&mut self, layer: &Self::Layer) {
        if self.active.remove(layer) && self.echo_layer_events {
            self.overlay_removed(layer);
        }
    }

    fn has_layer(&self, layer: &Self::Layer) -> bool {
        self.active.contains(layer)
    }

    fn restore_listeners_attached(&self) -> bool {
        self.attached
    }

    fn mark_restore_listeners_attached(&mut self) {
        self.attached = true;
    }

    fn subscribe(&mut self, listener: Listener<Self>) {
        self.listeners.push(listener);
    }
}
