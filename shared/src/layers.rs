use std::collections::BTreeMap;

use crate::settings::OverlayRef;

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayEntry<L> {
    Layer(L),
    Group(BTreeMap<String, L>),
}

/// Base layers and overlays known to a synchronizer, by name.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerConfig<L> {
    pub base_layers: BTreeMap<String, L>,
    pub overlays: BTreeMap<String, OverlayEntry<L>>,
}

impl<L> Default for LayerConfig<L> {
    fn default() -> Self {
        Self {
            base_layers: BTreeMap::new(),
            overlays: BTreeMap::new(),
        }
    }
}

impl<L> LayerConfig<L> {
    pub fn with_base_layer(mut self, name: impl Into<String>, layer: L) -> Self {
        self.base_layers.insert(name.into(), layer);
        self
    }

    pub fn with_overlay(mut self, name: impl Into<String>, layer: L) -> Self {
        self.overlays.insert(name.into(), OverlayEntry::Layer(layer));
        self
    }

    pub fn with_group(
        mut self,
        group: impl Into<String>,
        layers: impl IntoIterator<Item = (String, L)>,
    ) -> Self {
        self.overlays
            .insert(group.into(), OverlayEntry::Group(layers.into_iter().collect()));
        self
    }

    /// Look up the overlay a reference points at. Grouped references only
    /// match inside their group; ungrouped ones only match top-level layers.
    pub fn overlay(&self, overlay: &OverlayRef) -> Option<&L> {
        match &overlay.group {
            Some(group) => match self.overlays.get(group)? {
                OverlayEntry::Group(layers) => layers.get(&overlay.name),
                OverlayEntry::Layer(_) => None,
            },
            None => match self.overlays.get(&overlay.name)? {
                OverlayEntry::Layer(layer) => Some(layer),
                OverlayEntry::Group(_) => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LayerConfig<u32> {
        LayerConfig::default()
            .with_overlay("Parks", 1)
            .with_group("Transit", [("Bus".to_string(), 2), ("Rail".to_string(), 3)])
    }

    #[test]
    fn resolves_top_level_overlay() {
        assert_eq!(config().overlay(&OverlayRef::new("Parks")), Some(&1));
    }

    #[test]
    fn resolves_grouped_overlay() {
        assert_eq!(config().overlay(&OverlayRef::grouped("Transit", "Rail")), Some(&3));
    }

    #[test]
    fn misses_resolve_to_none() {
        let config = config();
        assert_eq!(config.overlay(&OverlayRef::new("Rivers")), None);
        assert_eq!(config.overlay(&OverlayRef::grouped("Transit", "Ferry")), None);
        assert_eq!(config.overlay(&OverlayRef::grouped("Nature", "Parks")), None);
        assert_eq!(config.overlay(&OverlayRef::grouped("Parks", "Parks")), None);
        assert_eq!(config.overlay(&OverlayRef::new("Transit")), None);
    }
}
