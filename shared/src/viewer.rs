use serde::{Deserialize, Serialize};

/// Options handed to the viewer's `loadMap`. Decoding fills any missing
/// field from [`ViewerOptions::default`], so stored overrides only need the
/// fields they change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerOptions {
    pub tooltips: bool,
    pub background: String,
    pub debug: bool,
    pub minimap: bool,
    pub navigation_control: String,
    pub searchable: bool,
    pub feature_info: bool,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            tooltips: true,
            background: "#EEF".to_string(),
            debug: false,
            minimap: false,
            navigation_control: "top-right".to_string(),
            searchable: true,
            feature_info: true,
        }
    }
}

/// Options for constructing the viewer's map manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerOptions {
    pub images: Vec<ImageResource>,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            images: vec![ImageResource::label_background()],
        }
    }
}

/// Stretchable image registered with the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResource {
    pub id: String,
    pub url: String,
    pub options: ImageOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOptions {
    pub content: [u32; 4],
    pub stretch_x: Vec<[u32; 2]>,
    pub stretch_y: Vec<[u32; 2]>,
}

const LABEL_BACKGROUND_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAC8AAAAmCAIAAADbSlUzAAAAAXNSR0IArs4c6QAAAARnQU1BAACxjwv8YQUAAAAJcEhZcwAAJOgAACToAYJjBRwAAACVSURBVFhH7dixDoJAEIThfXqMBcYKrTQ+jkYSStDYkVhZINxyEshJcZXJtC7FfNlmur9eyXb7Vqf6+bI9HUKyWkt5e4RlOF9ycerjsqbqpfefuKzNJawBWIOxBmMNxhqMNRhrMNZgrMFYg7EGYw3GGow1GGuw5dU07y4ua22nUlb3uKxd80IOx1Pjxp+f4P/P+ZButl+YrbXnPs+YmAAAAABJRU5ErkJggg==";

impl ImageResource {
    /// Rounded box drawn behind feature labels.
    pub fn label_background() -> Self {
        Self {
            id: "label-background".to_string(),
            url: LABEL_BACKGROUND_PNG.to_string(),
            options: ImageOptions {
                content: [21, 4, 28, 33],
                stretch_x: vec![[21, 28]],
                stretch_y: vec![[4, 33]],
            },
        }
    }
}

/// Anatomical features marked on every freshly opened map.
pub const DEFAULT_MARKERS: [&str; 5] = [
    "UBERON:0000948", // heart
    "UBERON:0002048", // lung
    "UBERON:0000945", // stomach
    "UBERON:0001155", // colon
    "UBERON:0001255", // urinary bladder
];
