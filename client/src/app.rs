use std::cell::RefCell;
use std::rc::Rc;

use gloo_storage::Storage;
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use flatmap_shared::{
    MapTarget, SelectorOption, ViewerOptions, build_logical_groups, order_for_display,
    resolve_initial_target, selector_options,
};

use crate::annotation::{
    AnnotationControl, AnnotationSession, DialogAction, DialogView, control_background,
};
use crate::catalog::fetch_catalog;
use crate::location;
use crate::logging;
use crate::selector::SharedSelector;
use crate::viewer::{ViewerMapLoader, ViewerSession};

const MAP_CONTAINER_ID: &str = "map-canvas";
const VIEWER_OPTIONS_KEY: &str = "flatmap_viewer_options";

#[derive(Default)]
struct Annotator {
    control: AnnotationControl,
    session: AnnotationSession,
}

struct Viewer {
    selector: SharedSelector<ViewerMapLoader>,
    annotations: RefCell<Annotator>,
}

struct KeydownBinding {
    window: web_sys::Window,
    handler: Closure<dyn Fn(web_sys::KeyboardEvent)>,
}

thread_local! {
    static VIEWER: RefCell<Option<Rc<Viewer>>> = const { RefCell::new(None) };
    static KEYDOWN_BINDING: RefCell<Option<KeydownBinding>> = const { RefCell::new(None) };
}

fn viewer() -> Option<Rc<Viewer>> {
    VIEWER.with(|slot| slot.borrow().clone())
}

fn alert(message: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.alert_with_message(message);
    }
}

/// Reactive UI state shared by the viewer callbacks.
#[derive(Clone, Copy)]
pub(crate) struct ViewerSignals {
    options: RwSignal<Vec<SelectorOption>>,
    annotating: RwSignal<bool>,
    dialog: RwSignal<Option<DialogView>>,
    dialog_text: RwSignal<String>,
    status: RwSignal<Option<String>>,
}

/// Resolve the initial map from the catalog and the page URL, then open it.
async fn boot(endpoint: &str, ui: ViewerSignals) {
    let catalog = match fetch_catalog(endpoint).await {
        Ok(catalog) => catalog,
        Err(e) => {
            logging::warn(&format!("Map catalog fetch failed: {e}"));
            ui.status.set(Some(format!("Map catalog unavailable: {e}")));
            return;
        }
    };

    let ordered = order_for_display(&build_logical_groups(&catalog));
    let requested = location::current_query();
    let resolution = resolve_initial_target(
        requested.id.as_deref(),
        requested.taxon.as_deref(),
        &ordered,
    );
    logging::info(&format!(
        "catalog_maps={} logical_maps={}",
        catalog.len(),
        ordered.len()
    ));
    ui.options.set(selector_options(&ordered, &resolution));

    match resolution.target {
        Some(target) => open_map(target, ui),
        None => ui.status.set(Some("No flatmaps available".to_string())),
    }
}

fn open_map(target: MapTarget, ui: ViewerSignals) {
    let Some(viewer) = viewer() else {
        return;
    };
    let loading = format!("Loading {}...", target.as_str());
    let switch = match viewer.selector.begin_switch(target, location::push_target) {
        Ok(switch) => switch,
        Err(e) => {
            logging::warn(&format!("Ignoring map request: {e}"));
            return;
        }
    };

    // The dialog belongs to the map that is about to close.
    viewer.annotations.borrow_mut().session.abandon();
    ui.status.set(Some(loading));

    spawn_local(async move {
        match switch.await {
            Ok(()) => {
                ui.status.set(None);
                viewer.selector.with_active(|session| {
                    session.on_feature_click(move |feature_id| annotate_feature(&feature_id, ui));
                });
            }
            Err(e) => {
                let message = e.to_string();
                logging::warn(&message);
                ui.status.set(Some(message.clone()));
                alert(&message);
            }
        }
    });
}

fn annotate_feature(feature_id: &str, ui: ViewerSignals) {
    let Some(viewer) = viewer() else {
        return;
    };
    let mut annotator = viewer.annotations.borrow_mut();
    if !annotator.control.enabled() {
        return;
    }

    let dialog = ui.dialog;
    let opened = viewer.selector.with_active(|session| {
        annotator
            .session
            .open(&*session, feature_id, move || dialog.set(None))
    });
    match opened {
        Some(Ok(view)) => {
            ui.dialog_text.set(view.initial_text.clone());
            ui.dialog.set(Some(view));
        }
        Some(Err(e)) => logging::warn(&e.to_string()),
        None => logging::warn(&format!("No open map to annotate '{feature_id}'")),
    }
}

fn finish_dialog(action: DialogAction, ui: ViewerSignals) {
    let Some(viewer) = viewer() else {
        return;
    };
    let text = ui.dialog_text.get_untracked();
    let mut annotator = viewer.annotations.borrow_mut();
    let closed = viewer
        .selector
        .with_active(|session| annotator.session.close(session, action, &text));
    match closed {
        Some(Ok(outcome)) => logging::info(&format!("annotation dialog closed: {outcome:?}")),
        Some(Err(e)) => {
            logging::warn(&e.to_string());
            ui.dialog.set(None);
        }
        None => {
            annotator.session.abandon();
            ui.dialog.set(None);
        }
    }
}

fn toggle_annotation(ui: ViewerSignals) {
    let Some(viewer) = viewer() else {
        return;
    };
    let mut annotator = viewer.annotations.borrow_mut();
    let enabled = match viewer
        .selector
        .with_active(|session| annotator.control.toggle(Some(session)))
    {
        Some(enabled) => enabled,
        None => annotator.control.toggle::<ViewerSession>(None),
    };
    ui.annotating.set(enabled);
}

/// Root application component.
#[component]
pub fn App() -> impl IntoView {
    let ui = ViewerSignals {
        options: RwSignal::new(Vec::new()),
        annotating: RwSignal::new(false),
        dialog: RwSignal::new(None),
        dialog_text: RwSignal::new(String::new()),
        status: RwSignal::new(None),
    };
    provide_context(ui);

    let saved: ViewerOptions =
        gloo_storage::LocalStorage::get(VIEWER_OPTIONS_KEY).unwrap_or_default();

    // Runs once after mount, so the map container exists before the first load.
    Effect::new(move || {
        if viewer().is_some() {
            return;
        }
        let endpoint = location::page_endpoint().unwrap_or_else(|| "/".to_string());
        let loader = match ViewerMapLoader::new(&endpoint, MAP_CONTAINER_ID, saved.clone()) {
            Ok(loader) => loader,
            Err(e) => {
                logging::warn(&e);
                ui.status.set(Some(e));
                return;
            }
        };
        VIEWER.with(|slot| {
            *slot.borrow_mut() = Some(Rc::new(Viewer {
                selector: SharedSelector::new(loader),
                annotations: RefCell::new(Annotator::default()),
            }));
        });
        spawn_local(async move {
            boot(&endpoint, ui).await;
        });
    });

    // Keyboard: `a` toggles annotation mode, Escape cancels the dialog.
    Effect::new(move || {
        let Some(window) = web_sys::window() else {
            return;
        };

        KEYDOWN_BINDING.with(|slot| {
            if let Some(old) = slot.borrow_mut().take() {
                let _ = old
                    .window
                    .remove_event_listener_with_callback("keydown", old.handler.as_ref().unchecked_ref());
            }
        });

        let handler =
            Closure::<dyn Fn(web_sys::KeyboardEvent)>::new(move |e: web_sys::KeyboardEvent| {
                let key = e.key();
                if key == "Escape" && ui.dialog.get_untracked().is_some() {
                    finish_dialog(DialogAction::Cancel, ui);
                    return;
                }

                let target_tag = e
                    .target()
                    .and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok())
                    .map(|el| el.tag_name())
                    .unwrap_or_default();
                if target_tag == "INPUT" || target_tag == "SELECT" {
                    return;
                }
                if key == "a" {
                    toggle_annotation(ui);
                }
            });
        if window
            .add_event_listener_with_callback("keydown", handler.as_ref().unchecked_ref())
            .is_err()
        {
            return;
        }
        KEYDOWN_BINDING.with(|slot| {
            *slot.borrow_mut() = Some(KeydownBinding {
                window: window.clone(),
                handler,
            });
        });
    });

    let on_select = move |e: leptos::ev::Event| {
        let Some(target) = e.target() else {
            return;
        };
        let Ok(select) = target.dyn_into::<web_sys::HtmlSelectElement>() else {
            return;
        };
        let value = select.value();
        if !value.is_empty() {
            open_map(MapTarget::Id(value), ui);
        }
    };

    view! {
        <div class="flatmap-viewer" style="position: relative; width: 100vw; height: 100vh; overflow: hidden;">
            <div
                class="flatmap-toolbar"
                style="position: absolute; top: 0; left: 0; right: 0; height: 40px; display: flex; align-items: center; gap: 12px; padding: 0 10px; background: #f4f4f8; border-bottom: 1px solid #ccd; z-index: 2;"
            >
                <select
                    id="map-selector"
                    on:change=on_select
                    style="min-width: 280px; font-size: 0.85rem; padding: 3px 6px;"
                >
                    {move || {
                        ui.options
                            .get()
                            .into_iter()
                            .map(|option| {
                                view! {
                                    <option value=option.value selected=option.selected>
                                        {option.label}
                                    </option>
                                }
                            })
                            .collect::<Vec<_>>()
                    }}
                </select>
                <span class="flatmap-status" style="font-size: 0.8rem; color: #666;">
                    {move || ui.status.get().unwrap_or_default()}
                </span>
            </div>
            <div id=MAP_CONTAINER_ID style="position: absolute; top: 40px; left: 0; right: 0; bottom: 0;"></div>
            <AnnotationToggle />
            {move || ui.dialog.get().map(|dialog| view! { <AnnotationDialog dialog=dialog /> })}
        </div>
    }
}

#[component]
fn AnnotationToggle() -> impl IntoView {
    let ui: ViewerSignals = expect_context();

    view! {
        <div
            class="mapboxgl-ctrl flatmap-annotation-control"
            title="Annotation mode (A)"
            style=move || {
                format!(
                    "position: absolute; top: 52px; left: 10px; z-index: 3; padding: 4px 8px; border-radius: 4px; border: 1px solid #999; cursor: pointer; font-family: monospace; user-select: none; background-color: {};",
                    control_background(ui.annotating.get()),
                )
            }
            on:click=move |_| toggle_annotation(ui)
        >
            {AnnotationControl::LABEL}
        </div>
    }
}

#[component]
fn AnnotationDialog(dialog: DialogView) -> impl IntoView {
    let ui: ViewerSignals = expect_context();

    let buttons = dialog
        .actions
        .iter()
        .map(|&action| {
            let autofocus = action == dialog.autofocus;
            view! {
                <span>
                    <button type="button" autofocus=autofocus on:click=move |_| finish_dialog(action, ui)>
                        {action.label()}
                    </button>
                </span>
            }
        })
        .collect::<Vec<_>>();

    let on_submit = move |e: leptos::ev::SubmitEvent| {
        e.prevent_default();
        finish_dialog(DialogAction::Save, ui);
    };

    view! {
        <div
            class="flatmap-dialog-backdrop"
            style="position: fixed; inset: 0; z-index: 10; display: flex; align-items: center; justify-content: center; background: rgba(0, 0, 0, 0.35);"
        >
            <form
                class="flatmap-annotation"
                on:submit=on_submit
                style="display: flex; flex-direction: column; gap: 8px; min-width: 320px; padding: 16px; background: #fff; border-radius: 6px; font-family: system-ui, sans-serif;"
            >
                <label for=dialog.field_id.clone()>{dialog.label.clone()}</label>
                <input
                    type="text"
                    id=dialog.field_id.clone()
                    name=dialog.feature_id.clone()
                    prop:value=move || ui.dialog_text.get()
                    on:input=move |e| ui.dialog_text.set(event_target_value(&e))
                />
                <div class="flatmap-buttons" style="display: flex; justify-content: flex-end; gap: 8px;">
                    {buttons}
                </div>
            </form>
        </div>
    }
}
