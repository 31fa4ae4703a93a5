use flatmap_shared::Annotation;
use thiserror::Error;

use crate::logging;

const ANNOTATION_OFF_BACKGROUND: &str = "#EEE";
const ANNOTATION_ON_BACKGROUND: &str = "#F44";

/// Layer switching exposed by an open map.
pub(crate) trait LayerHost {
    fn active_layer_id(&self) -> String;
    fn activate_layer(&mut self, layer_id: &str);
}

/// Per-feature note storage exposed by an open map. Storage is the map's business.
pub(crate) trait AnnotationHost: LayerHost {
    fn annotation_about(&self, feature_id: &str) -> Option<Annotation>;
    fn set_annotation_about(&mut self, feature_id: &str, annotation: &Annotation);
}

pub(crate) fn control_background(enabled: bool) -> &'static str {
    if enabled {
        ANNOTATION_ON_BACKGROUND
    } else {
        ANNOTATION_OFF_BACKGROUND
    }
}

/// Annotation mode flag behind the "An" map button.
#[derive(Debug, Default)]
pub(crate) struct AnnotationControl {
    enabled: bool,
}

impl AnnotationControl {
    pub const LABEL: &'static str = "An";

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Flip annotation mode and re-activate the host's current layer so its
    /// interaction handlers pick up the new mode. Returns the new state.
    pub fn toggle<H: LayerHost>(&mut self, host: Option<&mut H>) -> bool {
        self.enabled = !self.enabled;
        if let Some(host) = host {
            let layer = host.active_layer_id();
            host.activate_layer(&layer);
        }
        self.enabled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DialogAction {
    Save,
    Cancel,
}

impl DialogAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Save => "Save",
            Self::Cancel => "Cancel",
        }
    }
}

/// Everything the UI needs to present the annotation editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DialogView {
    pub feature_id: String,
    pub field_id: String,
    pub label: String,
    pub initial_text: String,
    pub actions: [DialogAction; 2],
    pub autofocus: DialogAction,
}

impl DialogView {
    fn new(feature_id: &str, initial_text: &str) -> Self {
        Self {
            feature_id: feature_id.to_string(),
            field_id: format!("annotate-{feature_id}"),
            label: format!("Annotate '{feature_id}':"),
            initial_text: initial_text.to_string(),
            actions: [DialogAction::Save, DialogAction::Cancel],
            autofocus: DialogAction::Cancel,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CloseOutcome {
    Saved,
    Unchanged,
    Discarded,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum AnnotationError {
    #[error("an annotation dialog is already open for '{0}'")]
    AlreadyOpen(String),
    #[error("no annotation dialog is open")]
    NotOpen,
}

struct OpenDialog {
    feature_id: String,
    annotation: Annotation,
    on_close: Box<dyn FnOnce()>,
}

/// Lifecycle of the single annotation edit: `open` → user picks an action →
/// `close`. Only one dialog may be open.
#[derive(Default)]
pub(crate) struct AnnotationSession {
    open: Option<OpenDialog>,
}

impl AnnotationSession {
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Load the feature's note (blank if it has none), move it onto the
    /// active layer if it was stored under another, and start editing it.
    pub fn open<H: AnnotationHost>(
        &mut self,
        host: &H,
        feature_id: &str,
        on_close: impl FnOnce() + 'static,
    ) -> Result<DialogView, AnnotationError> {
        if let Some(current) = &self.open {
            return Err(AnnotationError::AlreadyOpen(current.feature_id.clone()));
        }

        let active_layer = host.active_layer_id();
        let annotation = match host.annotation_about(feature_id) {
            Some(mut existing) => {
                if let Some(stored_layer) = existing.repair_layer(&active_layer) {
                    logging::warn(&format!(
                        "Annotation layer ({stored_layer}) didn't match active layer ({active_layer}) for '{feature_id}'"
                    ));
                }
                existing
            }
            None => Annotation::empty(active_layer),
        };

        let view = DialogView::new(feature_id, &annotation.annotation);
        self.open = Some(OpenDialog {
            feature_id: feature_id.to_string(),
            annotation,
            on_close: Box::new(on_close),
        });
        Ok(view)
    }

    /// Finish the edit. Save persists only when the text changed. The
    /// completion callback runs exactly once whatever the action.
    pub fn close<H: AnnotationHost>(
        &mut self,
        host: &mut H,
        action: DialogAction,
        field_value: &str,
    ) -> Result<CloseOutcome, AnnotationError> {
        let Some(OpenDialog {
            feature_id,
            mut annotation,
            on_close,
        }) = self.open.take()
        else {
            return Err(AnnotationError::NotOpen);
        };

        let outcome = match action {
            DialogAction::Save if annotation.annotation != field_value => {
                annotation.annotation = field_value.to_string();
                host.set_annotation_about(&feature_id, &annotation);
                CloseOutcome::Saved
            }
            DialogAction::Save => CloseOutcome::Unchanged,
            DialogAction::Cancel => CloseOutcome::Discarded,
        };

        on_close();
        Ok(outcome)
    }

    /// Drop the open edit without touching any map, e.g. when its map closes.
    pub fn abandon(&mut self) -> bool {
        match self.open.take() {
            Some(dialog) => {
                (dialog.on_close)();
                true
            }
            None => false,
        }
    }
}
