use flatmap_shared::query::{ID_PARAM, TAXON_PARAM};
use flatmap_shared::{MapQuery, MapTarget, map_endpoint};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Url, UrlSearchParams};

fn current_url() -> Option<Url> {
    let href = web_sys::window()?.location().href().ok()?;
    Url::new(&href).ok()
}

fn query_of(params: &UrlSearchParams) -> MapQuery {
    let mut pairs: Vec<(String, String)> = Vec::new();
    if let Ok(Some(entries)) = js_sys::try_iter(params) {
        for entry in entries.flatten() {
            let entry: js_sys::Array = entry.unchecked_into();
            if let (Some(key), Some(value)) = (entry.get(0).as_string(), entry.get(1).as_string()) {
                pairs.push((key, value));
            }
        }
    }
    MapQuery::from_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
}

fn write_param(params: &UrlSearchParams, key: &str, value: Option<&str>) {
    match value {
        Some(value) => params.set(key, value),
        None => params.delete(key),
    }
}

/// Map requested by the page URL (`?id=` or `?taxon=`).
pub fn current_query() -> MapQuery {
    current_url()
        .map(|url| query_of(&url.search_params()))
        .unwrap_or_default()
}

/// Map service endpoint derived from the page location.
pub fn page_endpoint() -> Option<String> {
    let location = web_sys::window()?.location();
    Some(map_endpoint(
        &location.origin().ok()?,
        &location.pathname().ok()?,
    ))
}

/// Record `target` in the URL and push one history entry for it.
pub fn push_target(target: &MapTarget) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(url) = current_url() else {
        return;
    };

    let params = url.search_params();
    let mut query = query_of(&params);
    query.record(target);
    write_param(&params, ID_PARAM, query.id.as_deref());
    write_param(&params, TAXON_PARAM, query.taxon.as_deref());

    let title = window.document().map(|doc| doc.title()).unwrap_or_default();
    if let Ok(history) = window.history() {
        let _ = history.push_state_with_url(&JsValue::from_str("data"), &title, Some(&url.href()));
    }
}
