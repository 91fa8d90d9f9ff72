/// Geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Events the synchronizer listens for.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    BaseLayerChange { name: String },
    FullscreenChange,
    MoveEnd,
    OverlayAdd { name: String, group: Option<String> },
    OverlayRemove { name: String, group: Option<String> },
}

impl MapEvent {
    /// Host event names, in the order listeners are registered.
    pub const NAMES: [&'static str; 5] = [
        "baselayerchange",
        "fullscreenchange",
        "moveend",
        "overlayadd",
        "overlayremove",
    ];
}

pub type Listener<M> = Box<dyn FnMut(&M, &MapEvent)>;

/// Capabilities required from the host map widget.
pub trait MapWidget: Sized + 'static {
    /// Handle identifying a layer the widget can show.
    type Layer: Clone + 'static;

    fn center(&self) -> LatLng;
    fn zoom(&self) -> f64;
    fn set_view(&mut self, center: LatLng, zoom: f64, animate: bool);
    /// False until the widget has an initial view; center and zoom are meaningless before.
    fn is_loaded(&self) -> bool;

    fn is_fullscreen(&self) -> bool;
    fn toggle_fullscreen(&mut self);

    fn add_layer(&mut self, layer: &Self::Layer);
    fn remove_layer(&mut self, layer: &Self::Layer);
    fn has_layer(&self, layer: &Self::Layer) -> bool;

    /// Marker kept on the widget instance so listeners are registered once.
    fn restore_listeners_attached(&self) -> bool;
    fn mark_restore_listeners_attached(&mut self);
    /// Deliver every event in [`MapEvent::NAMES`] to `listener`.
    fn subscribe(&mut self, listener: Listener<Self>);
}
