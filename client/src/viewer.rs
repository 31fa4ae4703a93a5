//! Bindings to the JavaScript flatmap viewer (`window.flatmap`), which does
//! all map rendering.

use flatmap_shared::{Annotation, ManagerOptions, MapTarget, ViewerOptions};
use js_sys::{Function, Promise};
use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::annotation::{AnnotationHost, LayerHost};
use crate::logging;
use crate::selector::{MapLoader, MapSession};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = flatmap)]
    type MapManager;

    #[wasm_bindgen(constructor, js_namespace = flatmap)]
    fn new(endpoint: &str, options: &JsValue) -> MapManager;

    #[wasm_bindgen(method, js_name = loadMap)]
    fn load_map(
        this: &MapManager,
        target: &str,
        container_id: &str,
        logger: &Function,
        options: &JsValue,
    ) -> Promise;

    type FlatMap;

    #[wasm_bindgen(method)]
    fn close(this: &FlatMap);

    #[wasm_bindgen(method, js_name = addMarker)]
    fn add_marker(this: &FlatMap, feature_id: &str);

    #[wasm_bindgen(method, getter, js_name = activeLayerId)]
    fn active_layer_id(this: &FlatMap) -> Option<String>;

    #[wasm_bindgen(method, js_name = activateLayer)]
    fn activate_layer(this: &FlatMap, layer_id: &str);

    #[wasm_bindgen(method, js_name = annotationAbout)]
    fn annotation_about(this: &FlatMap, feature_id: &str) -> JsValue;

    #[wasm_bindgen(method, js_name = setAnnotationAbout)]
    fn set_annotation_about(this: &FlatMap, feature_id: &str, annotation: &JsValue);

    #[wasm_bindgen(method, js_name = setFeatureClickHandler)]
    fn set_feature_click_handler(this: &FlatMap, handler: &Function);
}

fn js_error_text(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| {
            err.dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{err:?}"))
}

/// Opens maps through the viewer's map manager.
pub(crate) struct ViewerMapLoader {
    manager: MapManager,
    container_id: String,
    options: ViewerOptions,
    logger: Closure<dyn Fn(JsValue)>,
}

impl ViewerMapLoader {
    pub fn new(endpoint: &str, container_id: &str, options: ViewerOptions) -> Result<Self, String> {
        let manager_options = serde_wasm_bindgen::to_value(&ManagerOptions::default())
            .map_err(|e| format!("options error: {e}"))?;
        let logger = Closure::<dyn Fn(JsValue)>::new(|message: JsValue| {
            logging::info(&message.as_string().unwrap_or_else(|| format!("{message:?}")));
        });
        Ok(Self {
            manager: MapManager::new(endpoint, &manager_options),
            container_id: container_id.to_string(),
            options,
            logger,
        })
    }
}

impl MapLoader for ViewerMapLoader {
    type Session = ViewerSession;

    async fn load_map(&self, target: &MapTarget) -> Result<ViewerSession, String> {
        let options = serde_wasm_bindgen::to_value(&self.options)
            .map_err(|e| format!("options error: {e}"))?;
        let promise = self.manager.load_map(
            target.as_str(),
            &self.container_id,
            self.logger.as_ref().unchecked_ref(),
            &options,
        );
        let map = JsFuture::from(promise)
            .await
            .map_err(|e| js_error_text(&e))?;
        Ok(ViewerSession {
            map: map.unchecked_into(),
            click_handler: None,
        })
    }
}

/// One map open in the viewer.
pub(crate) struct ViewerSession {
    map: FlatMap,
    click_handler: Option<Closure<dyn Fn(String)>>,
}

impl ViewerSession {
    /// Route feature clicks on this map to `handler`.
    pub fn on_feature_click(&mut self, handler: impl Fn(String) + 'static) {
        let handler = Closure::<dyn Fn(String)>::new(handler);
        self.map
            .set_feature_click_handler(handler.as_ref().unchecked_ref());
        self.click_handler = Some(handler);
    }
}

impl MapSession for ViewerSession {
    fn close(&mut self) {
        self.map.close();
        self.click_handler = None;
    }

    fn add_marker(&mut self, feature_id: &str) {
        self.map.add_marker(feature_id);
    }
}

impl LayerHost for ViewerSession {
    fn active_layer_id(&self) -> String {
        self.map.active_layer_id().unwrap_or_default()
    }

    fn activate_layer(&mut self, layer_id: &str) {
        self.map.activate_layer(layer_id);
    }
}

impl AnnotationHost for ViewerSession {
    fn annotation_about(&self, feature_id: &str) -> Option<Annotation> {
        let value = self.map.annotation_about(feature_id);
        if value.is_null() || value.is_undefined() {
            return None;
        }
        match serde_wasm_bindgen::from_value(value) {
            Ok(annotation) => Some(annotation),
            Err(e) => {
                logging::warn(&format!("Unreadable annotation for '{feature_id}': {e}"));
                None
            }
        }
    }

    fn set_annotation_about(&mut self, feature_id: &str, annotation: &Annotation) {
        // Plain objects, not `Map`s, so the viewer reads its own fields back.
        match annotation.serialize(&serde_wasm_bindgen::Serializer::json_compatible()) {
            Ok(value) => self.map.set_annotation_about(feature_id, &value),
            Err(e) => logging::warn(&format!("Failed to encode annotation for '{feature_id}': {e}")),
        }
    }
}
