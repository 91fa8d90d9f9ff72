use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// A trackable overlay, optionally nested under a layer group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayRef {
    #[serde(default)]
    pub group: Option<String>,
    pub name: String,
}

impl OverlayRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            group: None,
            name: name.into(),
        }
    }

    pub fn grouped(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: Some(group.into()),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackAction {
    Add,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayerSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default)]
    pub add: Vec<OverlayRef>,
    #[serde(default)]
    pub remove: Vec<OverlayRef>,
}

impl LayerSettings {
    /// Record an overlay toggle. The overlay lands in the list matching
    /// `action` (once) and leaves the other one, so a name is never in both.
    pub fn track(&mut self, overlay: &OverlayRef, action: TrackAction) {
        let (target, other) = match action {
            TrackAction::Add => (&mut self.add, &mut self.remove),
            TrackAction::Remove => (&mut self.remove, &mut self.add),
        };
        if index_of(target, &overlay.name).is_none() {
            target.push(overlay.clone());
        }
        if let Some(i) = index_of(other, &overlay.name) {
            other.remove(i);
        }
    }
}

// Matches by name only; the group is not part of the identity.
fn index_of(list: &[OverlayRef], name: &str) -> Option<usize> {
    list.iter().position(|layer| layer.name == name)
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewSettings {
    #[serde(default, skip_serializing_if = "Option::is_none", serialize_with = "js_number")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", serialize_with = "js_number")]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", serialize_with = "js_number")]
    pub zoom: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<bool>,
}

impl ViewSettings {
    pub fn is_empty(&self) -> bool {
        self.lat.is_none() && self.lng.is_none() && self.zoom.is_none() && self.fs.is_none()
    }
}

// Largest integer a JS number holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Write whole numbers without a fraction (`13`, not `13.0`), as browsers do.
fn js_number<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match *value {
        Some(v) if v.fract() == 0.0 && v.abs() <= MAX_SAFE_INTEGER => {
            serializer.serialize_i64(v as i64)
        }
        Some(v) => serializer.serialize_f64(v),
        None => serializer.serialize_none(),
    }
}

/// Everything stored under one key: `scope -> id -> settings`.
///
/// Buckets are decoded one at a time; every other scope and id is kept as
/// parsed, so a malformed neighbour neither blocks a restore nor gets lost
/// when the document is written back.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsDocument<T> {
    scopes: Map<String, Value>,
    _bucket: PhantomData<fn() -> T>,
}

impl<T> Default for SettingsDocument<T> {
    fn default() -> Self {
        Self {
            scopes: Map::new(),
            _bucket: PhantomData,
        }
    }
}

impl<T: Default + Serialize + DeserializeOwned> SettingsDocument<T> {
    /// Parse a stored document. Only the top level has to be a JSON object.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        let scopes = serde_json::from_str::<Map<String, Value>>(raw)?;
        Ok(Self {
            scopes,
            _bucket: PhantomData,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.scopes)
    }

    /// Decode one bucket; `Ok(None)` when the scope or the id is absent.
    pub fn bucket(&self, scope: &str, id: &str) -> serde_json::Result<Option<T>> {
        match self.scopes.get(scope).and_then(|ids| ids.get(id)) {
            Some(value) => T::deserialize(value).map(Some),
            None => Ok(None),
        }
    }

    /// Replace one bucket, creating its scope when missing. A scope entry
    /// that is not an object is replaced by one.
    pub fn set_bucket(&mut self, scope: &str, id: &str, bucket: &T) -> serde_json::Result<()> {
        let value = serde_json::to_value(bucket)?;
        let ids = self
            .scopes
            .entry(scope)
            .or_insert_with(|| Value::Object(Map::new()));
        if !ids.is_object() {
            *ids = Value::Object(Map::new());
        }
        if let Value::Object(ids) = ids {
            ids.insert(id.to_string(), value);
        }
        Ok(())
    }
}

pub type LayersDocument = SettingsDocument<LayerSettings>;
pub type ViewDocument = SettingsDocument<ViewSettings>;

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[OverlayRef]) -> Vec<&str> {
        list.iter().map(|layer| layer.name.as_str()).collect()
    }

    #[test]
    fn track_add_appends_once() {
        let mut settings = LayerSettings::default();
        settings.track(&OverlayRef::new("Parks"), TrackAction::Add);
        settings.track(&OverlayRef::new("Parks"), TrackAction::Add);
        assert_eq!(names(&settings.add), vec!["Parks"]);
        assert!(settings.remove.is_empty());
    }

    #[test]
    fn track_moves_overlay_between_lists() {
        let mut settings = LayerSettings::default();
        let parks = OverlayRef::new("Parks");
        settings.track(&parks, TrackAction::Add);
        settings.track(&parks, TrackAction::Remove);
        assert!(settings.add.is_empty());
        assert_eq!(names(&settings.remove), vec!["Parks"]);

        settings.track(&parks, TrackAction::Add);
        assert_eq!(names(&settings.add), vec!["Parks"]);
        assert!(settings.remove.is_empty());
    }

    #[test]
    fn track_keeps_names_mutually_exclusive_over_any_sequence() {
        let mut settings = LayerSettings::default();
        let events = [
            ("Parks", TrackAction::Add),
            ("Rivers", TrackAction::Remove),
            ("Parks", TrackAction::Remove),
            ("Rivers", TrackAction::Remove),
            ("Rivers", TrackAction::Add),
            ("Trails", TrackAction::Add),
            ("Parks", TrackAction::Add),
            ("Trails", TrackAction::Remove),
        ];
        for (name, action) in events {
            settings.track(&OverlayRef::new(name), action);
            for layer in &settings.add {
                assert!(!settings.remove.iter().any(|r| r.name == layer.name));
            }
            for list in [&settings.add, &settings.remove] {
                let mut seen = names(list);
                seen.sort_unstable();
                seen.dedup();
                assert_eq!(seen.len(), list.len());
            }
        }
        assert_eq!(names(&settings.add), vec!["Rivers", "Parks"]);
        assert_eq!(names(&settings.remove), vec!["Trails"]);
    }

    #[test]
    fn track_matches_by_name_regardless_of_group() {
        let mut settings = LayerSettings::default();
        settings.track(&OverlayRef::grouped("Nature", "Parks"), TrackAction::Add);
        settings.track(&OverlayRef::new("Parks"), TrackAction::Remove);
        assert!(settings.add.is_empty());
        assert_eq!(settings.remove, vec![OverlayRef::new("Parks")]);
    }

    #[test]
    fn layer_settings_serialize_without_unset_base() {
        let mut settings = LayerSettings::default();
        settings.track(&OverlayRef::new("Parks"), TrackAction::Add);
        assert_eq!(
            serde_json::to_string(&settings).unwrap(),
            r#"{"add":[{"group":null,"name":"Parks"}],"remove":[]}"#
        );
    }

    #[test]
    fn view_settings_treat_missing_fields_as_unset() {
        let view: ViewSettings = serde_json::from_str(r#"{"fs":true}"#).unwrap();
        assert_eq!(view.lat, None);
        assert_eq!(view.fs, Some(true));
        assert!(!view.is_empty());
        assert!(ViewSettings::default().is_empty());
        assert_eq!(serde_json::to_string(&ViewSettings::default()).unwrap(), "{}");
    }

    #[test]
    fn view_numbers_are_written_like_javascript() {
        let view = ViewSettings {
            lat: Some(51.5),
            lng: Some(-0.0),
            zoom: Some(13.0),
            fs: None,
        };
        assert_eq!(
            serde_json::to_string(&view).unwrap(),
            r#"{"lat":51.5,"lng":0,"zoom":13}"#
        );
        let again: ViewSettings = serde_json::from_str(r#"{"lat":51.5,"lng":0,"zoom":13}"#).unwrap();
        assert_eq!(again.zoom, Some(13.0));
    }

    #[test]
    fn set_bucket_creates_nested_containers() {
        let mut doc = LayersDocument::default();
        let settings = LayerSettings {
            base: Some("Streets".into()),
            ..LayerSettings::default()
        };
        doc.set_bucket("global", "shared", &settings).unwrap();
        assert_eq!(
            doc.to_json().unwrap(),
            r#"{"global":{"shared":{"base":"Streets","add":[],"remove":[]}}}"#
        );
        assert_eq!(doc.bucket("global", "shared").unwrap(), Some(settings));
        assert_eq!(doc.bucket("global", "other").unwrap(), None);
        assert_eq!(doc.bucket("elsewhere", "shared").unwrap(), None);
    }

    #[test]
    fn malformed_foreign_bucket_does_not_affect_own_bucket() {
        let raw = r#"{"global":{"shared":{"add":[{"group":null,"name":"Parks"}],"remove":[]}},"admin":{"x":{"add":5}}}"#;
        let mut doc = LayersDocument::from_json(raw).unwrap();
        let mut own = doc.bucket("global", "shared").unwrap().unwrap_or_default();
        assert_eq!(own.add, vec![OverlayRef::new("Parks")]);
        assert!(doc.bucket("admin", "x").is_err());

        own.track(&OverlayRef::new("Parks"), TrackAction::Remove);
        doc.set_bucket("global", "shared", &own).unwrap();
        assert_eq!(
            doc.to_json().unwrap(),
            r#"{"global":{"shared":{"add":[],"remove":[{"group":null,"name":"Parks"}]}},"admin":{"x":{"add":5}}}"#
        );
    }

    #[test]
    fn set_bucket_replaces_scope_that_is_not_an_object() {
        let mut doc = ViewDocument::from_json(r#"{"global":5,"admin":{"b":{"fs":false}}}"#).unwrap();
        assert_eq!(doc.bucket("global", "shared").unwrap(), None);
        let view = ViewSettings {
            fs: Some(true),
            ..ViewSettings::default()
        };
        doc.set_bucket("global", "shared", &view).unwrap();
        assert_eq!(
            doc.to_json().unwrap(),
            r#"{"global":{"shared":{"fs":true}},"admin":{"b":{"fs":false}}}"#
        );
    }

    #[test]
    fn rejects_documents_that_are_not_objects() {
        assert!(LayersDocument::from_json("[]").is_err());
        assert!(ViewDocument::from_json("{not json").is_err());
    }
}
