use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::{LAYERS_KEY, RestoreOptions, SettingsKeys, VIEW_KEY};
use crate::error::RestoreError;
use crate::layers::{LayerConfig, OverlayEntry};
use crate::map::{LatLng, MapEvent, MapWidget};
use crate::settings::{
    LayerSettings, LayersDocument, OverlayRef, SettingsDocument, TrackAction, ViewDocument,
    ViewSettings,
};
use crate::storage::{KeyValueStore, Stores, load_document, save_document};

/// Mirrors layer, view and fullscreen state of one map into storage and
/// replays it when attached.
pub struct MapRestore<M: MapWidget> {
    keys: SettingsKeys,
    layers: LayerConfig<M::Layer>,
    layer_store: Rc<dyn KeyValueStore>,
    view_store: Rc<dyn KeyValueStore>,
    /// Whole stored documents; only this map's buckets are decoded.
    layer_doc: LayersDocument,
    view_doc: ViewDocument,
    layer_settings: LayerSettings,
    view_settings: ViewSettings,
}

impl<M: MapWidget> MapRestore<M> {
    fn new(options: &RestoreOptions, layers: LayerConfig<M::Layer>, stores: &Stores) -> Self {
        let keys = options.keys();
        let layer_store = stores.get(options.layer_storage_type);
        let view_store = stores.get(options.view_storage_type);

        let (layer_doc, layer_settings) =
            load_bucket(layer_store.as_ref(), LAYERS_KEY, &keys.scope, &keys.layers_id);
        let (view_doc, view_settings) =
            load_bucket(view_store.as_ref(), VIEW_KEY, &keys.scope, &keys.view_id);

        Self {
            keys,
            layers,
            layer_store,
            view_store,
            layer_doc,
            view_doc,
            layer_settings,
            view_settings,
        }
    }

    /// Load persisted settings, start tracking `map` and restore its state.
    ///
    /// Never fails: unreadable settings and restore errors are logged and the
    /// map keeps whatever state it already had.
    pub fn attach(
        map: &mut M,
        options: &RestoreOptions,
        layers: LayerConfig<M::Layer>,
        stores: &Stores,
    ) -> RestoreHandle<M> {
        let restore = Rc::new(RefCell::new(Self::new(options, layers, stores)));
        Self::listen(map, &restore);

        let restored = restore.borrow().restore(map);
        if let Err(e) = restored {
            tracing::error!(error = %e, "failed to restore map state");
        }
        RestoreHandle { inner: restore }
    }

    fn listen(map: &mut M, restore: &Rc<RefCell<Self>>) {
        if map.restore_listeners_attached() {
            tracing::debug!("map already has restore listeners");
            return;
        }
        let shared = Rc::clone(restore);
        map.subscribe(Box::new(move |map: &M, event: &MapEvent| {
            match shared.try_borrow_mut() {
                Ok(mut restore) => restore.handle_event(map, event),
                // Raised by our own restore; the settings already say so.
                Err(_) => tracing::trace!(?event, "ignoring re-entrant map event"),
            }
        }));
        map.mark_restore_listeners_attached();
    }

    fn handle_event(&mut self, map: &M, event: &MapEvent) {
        match event {
            MapEvent::BaseLayerChange { name } => {
                self.layer_settings.base = Some(name.clone());
                self.persist_layers();
            }
            MapEvent::FullscreenChange => {
                self.view_settings.fs = Some(map.is_fullscreen());
                self.persist_view();
            }
            MapEvent::MoveEnd => {
                if !map.is_loaded() {
                    return;
                }
                let center = map.center();
                let zoom = map.zoom();
                let view = &mut self.view_settings;
                view.lat = Some(center.lat);
                view.lng = Some(center.lng);
                view.zoom = Some(zoom);
                self.persist_view();
            }
            MapEvent::OverlayAdd { name, group } => {
                let overlay = OverlayRef {
                    group: group.clone(),
                    name: name.clone(),
                };
                self.track(overlay, TrackAction::Add);
            }
            MapEvent::OverlayRemove { name, group } => {
                let overlay = OverlayRef {
                    group: group.clone(),
                    name: name.clone(),
                };
                self.track(overlay, TrackAction::Remove);
            }
        }
    }

    fn track(&mut self, overlay: OverlayRef, action: TrackAction) {
        if self.layers.overlay(&overlay).is_none() {
            tracing::debug!(
                name = %overlay.name,
                group = ?overlay.group,
                "ignoring unconfigured overlay"
            );
            return;
        }
        self.layer_settings.track(&overlay, action);
        self.persist_layers();
    }

    fn persist_layers(&mut self) {
        let saved = persist(
            self.layer_store.as_ref(),
            LAYERS_KEY,
            &mut self.layer_doc,
            (self.keys.scope.as_str(), self.keys.layers_id.as_str()),
            &self.layer_settings,
        );
        if let Err(e) = saved {
            tracing::warn!(error = %e, key = LAYERS_KEY, "failed to persist map settings");
        }
    }

    fn persist_view(&mut self) {
        let saved = persist(
            self.view_store.as_ref(),
            VIEW_KEY,
            &mut self.view_doc,
            (self.keys.scope.as_str(), self.keys.view_id.as_str()),
            &self.view_settings,
        );
        if let Err(e) = saved {
            tracing::warn!(error = %e, key = VIEW_KEY, "failed to persist map settings");
        }
    }

    fn restore(&self, map: &mut M) -> Result<(), RestoreError> {
        self.restore_layers(map);
        self.restore_view(map)
    }

    fn restore_layers(&self, map: &mut M) {
        let settings = &self.layer_settings;

        if let Some(base) = &settings.base
            && self.layers.base_layers.contains_key(base)
        {
            for (name, layer) in &self.layers.base_layers {
                let active = map.has_layer(layer);
                if name == base && !active {
                    map.add_layer(layer);
                } else if name != base && active {
                    map.remove_layer(layer);
                }
            }
        }

        for overlay in &settings.add {
            if let Some(layer) = self.layers.overlay(overlay)
                && !map.has_layer(layer)
            {
                map.add_layer(layer);
            }
        }
        for overlay in &settings.remove {
            if let Some(layer) = self.layers.overlay(overlay)
                && map.has_layer(layer)
            {
                map.remove_layer(layer);
            }
        }
    }

    fn restore_view(&self, map: &mut M) -> Result<(), RestoreError> {
        let settings = &self.view_settings;
        if settings.is_empty() {
            return Ok(());
        }

        let (Some(lat), Some(lng), Some(zoom)) = (settings.lat, settings.lng, settings.zoom) else {
            return Err(RestoreError::IncompleteView {
                scope: self.keys.scope.clone(),
                id: self.keys.view_id.clone(),
            });
        };
        map.set_view(LatLng::new(lat, lng), zoom, false);

        if settings.fs == Some(true) && !map.is_fullscreen() {
            map.toggle_fullscreen();
        }
        Ok(())
    }
}

/// Read a stored document and decode this map's bucket from it. Either step
/// failing is logged and falls back to an empty value; foreign buckets stay
/// in the document untouched.
fn load_bucket<T>(
    store: &dyn KeyValueStore,
    key: &'static str,
    scope: &str,
    id: &str,
) -> (SettingsDocument<T>, T)
where
    T: Default + Serialize + DeserializeOwned,
{
    let doc = load_document(store, key).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "discarding stored map settings");
        SettingsDocument::default()
    });
    let bucket = match doc.bucket(scope, id) {
        Ok(bucket) => bucket.unwrap_or_default(),
        Err(source) => {
            let e = RestoreError::Decode { key, source };
            tracing::warn!(error = %e, scope, id, "discarding stored map settings");
            T::default()
        }
    };
    (doc, bucket)
}

fn persist<T>(
    store: &dyn KeyValueStore,
    key: &'static str,
    doc: &mut SettingsDocument<T>,
    (scope, id): (&str, &str),
    bucket: &T,
) -> Result<(), RestoreError>
where
    T: Default + Serialize + DeserializeOwned,
{
    doc.set_bucket(scope, id, bucket)?;
    save_document(store, key, doc)
}

/// Public face of an attached synchronizer.
pub struct RestoreHandle<M: MapWidget> {
    inner: Rc<RefCell<MapRestore<M>>>,
}

impl<M: MapWidget> RestoreHandle<M> {
    /// Register a top-level overlay, then re-apply the stored layers so a
    /// previously recorded state for `name` takes effect.
    pub fn add_overlay(&self, map: &mut M, name: impl Into<String>, layer: M::Layer) {
        let Ok(mut restore) = self.inner.try_borrow_mut() else {
            tracing::warn!("map restore is busy; overlay not added");
            return;
        };
        restore
            .layers
            .overlays
            .insert(name.into(), OverlayEntry::Layer(layer));
        restore.restore_layers(map);
    }

    /// Forget an overlay by name, then re-apply the stored layers.
    /// Returns whether the name was configured.
    pub fn remove_overlay(&self, map: &mut M, name: &str) -> bool {
        let Ok(mut restore) = self.inner.try_borrow_mut() else {
            tracing::warn!("map restore is busy; overlay not removed");
            return false;
        };
        let removed = restore.layers.overlays.remove(name).is_some();
        restore.restore_layers(map);
        removed
    }

    pub fn keys(&self) -> SettingsKeys {
        self.inner.borrow().keys.clone()
    }

    /// Current in-memory layer settings of this map's bucket.
    pub fn layer_settings(&self) -> LayerSettings {
        self.inner.borrow().layer_settings.clone()
    }

    /// Current in-memory view settings of this map's bucket.
    pub fn view_settings(&self) -> ViewSettings {
        self.inner.borrow().view_settings.clone()
    }
}

impl<M: MapWidget> Clone for RestoreHandle<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}
