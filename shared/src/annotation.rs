use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Text note attached to a feature, scoped to the layer it was written on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub layer: String,
    #[serde(default)]
    pub annotation: String,
    /// Fields the viewer stores alongside the note, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Annotation {
    pub fn new(layer: impl Into<String>, annotation: impl Into<String>) -> Self {
        Self {
            layer: layer.into(),
            annotation: annotation.into(),
            extra: Map::new(),
        }
    }

    /// A blank note on `layer`.
    pub fn empty(layer: impl Into<String>) -> Self {
        Self::new(layer, "")
    }

    /// Move the note onto `active_layer`. Returns the layer it was stored
    /// under when that differed.
    pub fn repair_layer(&mut self, active_layer: &str) -> Option<String> {
        if self.layer == active_layer {
            return None;
        }
        Some(std::mem::replace(&mut self.layer, active_layer.to_string()))
    }
}
