use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::config::CATALOG_CACHE_CONTROL;
use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.catalog.read().await;
    Json(serde_json::json!({
        "status": "ok",
        "maps": snapshot.catalog.len(),
        "generation": snapshot.generation,
        "refreshed_at": snapshot.refreshed_at.map(|at| at.to_rfc3339()),
    }))
}

/// Every published map version, keyed by id. Serves the JSON serialized at
/// scan time.
pub async fn get_maps(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let (etag, json): (String, Arc<Bytes>) = {
        let snapshot = state.catalog.read().await;
        (
            catalog_etag(snapshot.generation),
            Arc::clone(&snapshot.catalog_json),
        )
    };

    if if_none_match_matches(&headers, &etag) {
        return not_modified_response(CATALOG_CACHE_CONTROL, Some(etag.as_str()));
    }

    json_bytes_response((*json).clone(), CATALOG_CACHE_CONTROL, Some(etag.as_str()))
}

/// Newest version of each logical map, most recent first.
pub async fn get_latest_maps(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let (etag, json): (String, Arc<Bytes>) = {
        let snapshot = state.catalog.read().await;
        (
            latest_etag(snapshot.generation),
            Arc::clone(&snapshot.latest_json),
        )
    };

    if if_none_match_matches(&headers, &etag) {
        return not_modified_response(CATALOG_CACHE_CONTROL, Some(etag.as_str()));
    }

    json_bytes_response((*json).clone(), CATALOG_CACHE_CONTROL, Some(etag.as_str()))
}

fn catalog_etag(generation: u64) -> String {
    format!("\"catalog-{generation}\"")
}

fn latest_etag(generation: u64) -> String {
    format!("\"latest-{generation}\"")
}

fn json_bytes_response(body: Bytes, cache_control: &'static str, etag: Option<&str>) -> Response {
    let mut response = Response::new(Body::from(body));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    if let Some(etag) = etag
        && let Ok(etag_header) = HeaderValue::from_str(etag)
    {
        headers.insert(header::ETAG, etag_header);
    }
    response
}

fn not_modified_response(cache_control: &'static str, etag: Option<&str>) -> Response {
    let mut response = StatusCode::NOT_MODIFIED.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    if let Some(etag) = etag
        && let Ok(etag_header) = HeaderValue::from_str(etag)
    {
        headers.insert(header::ETAG, etag_header);
    }
    response
}

fn normalize_etag(candidate: &str) -> &str {
    candidate.strip_prefix("W/").unwrap_or(candidate).trim()
}

fn if_none_match_matches(headers: &HeaderMap, etag: &str) -> bool {
    let Some(value) = headers.get(header::IF_NONE_MATCH) else {
        return false;
    };
    let Ok(raw) = value.to_str() else {
        return false;
    };

    raw.split(',').any(|candidate| {
        let candidate = candidate.trim();
        candidate == "*" || normalize_etag(candidate) == normalize_etag(etag)
    })
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::path::PathBuf;

    use axum::http::{HeaderMap, HeaderValue, header};
    use flatmap_shared::{MapCatalog, MapDescriptor};

    use super::{StatusCode, if_none_match_matches};
    use crate::state::AppState;

    async fn spawn_test_server(state: AppState) -> (SocketAddr, tokio::task::JoinHandle<()>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener address");
        let app = crate::app::build_app(state);
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve test app");
        });
        (addr, handle)
    }

    fn descriptor(id: &str, name: &str, created: &str) -> MapDescriptor {
        MapDescriptor {
            id: id.to_string(),
            name: Some(name.to_string()),
            describes: Some("NCBITaxon:10114".to_string()),
            created: created.to_string(),
        }
    }

    async fn seeded_state() -> AppState {
        let state = AppState::new(PathBuf::from("maps"), PathBuf::from("client/dist"));
        let catalog: MapCatalog = [
            descriptor("rat-v1", "Rat", "2023-11-02T10:00:00"),
            descriptor("rat-v2", "Rat", "2024-02-14T09:30:00"),
            descriptor("rat-vagus", "Vagus", "2024-01-05T12:00:00"),
        ]
        .into_iter()
        .collect();
        state
            .replace_catalog(catalog)
            .await
            .expect("serialize catalog");
        state
    }

    #[test]
    fn if_none_match_accepts_weak_lists_and_wildcard() {
        let mut headers = HeaderMap::new();
        assert!(!if_none_match_matches(&headers, "\"catalog-3\""));

        headers.insert(
            header::IF_NONE_MATCH,
            HeaderValue::from_static("\"catalog-1\", W/\"catalog-3\""),
        );
        assert!(if_none_match_matches(&headers, "\"catalog-3\""));
        assert!(!if_none_match_matches(&headers, "\"catalog-2\""));

        headers.insert(header::IF_NONE_MATCH, HeaderValue::from_static("*"));
        assert!(if_none_match_matches(&headers, "\"catalog-9\""));
    }

    #[tokio::test]
    async fn maps_endpoint_serves_catalog_with_etag() {
        let (addr, server_handle) = spawn_test_server(seeded_state().await).await;
        let client = reqwest::Client::new();
        let url = format!("http://{addr}/api/maps");

        let response = client.get(&url).send().await.expect("maps request");
        assert_eq!(response.status().as_u16(), StatusCode::OK.as_u16());
        let etag = response
            .headers()
            .get("etag")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .expect("etag header");
        assert_eq!(etag, "\"catalog-1\"");
        assert_eq!(
            response
                .headers()
                .get("cache-control")
                .and_then(|value| value.to_str().ok()),
            Some("public, max-age=30")
        );

        let body: serde_json::Value = response.json().await.expect("maps json");
        let maps = body.as_object().expect("catalog is an object");
        assert_eq!(maps.len(), 3);
        assert_eq!(maps["rat-v2"]["created"], "2024-02-14T09:30:00");

        let cached = client
            .get(&url)
            .header("if-none-match", format!("W/{etag}"))
            .send()
            .await
            .expect("conditional maps request");
        assert_eq!(cached.status().as_u16(), StatusCode::NOT_MODIFIED.as_u16());

        server_handle.abort();
    }

    #[tokio::test]
    async fn latest_endpoint_returns_newest_per_logical_map() {
        let (addr, server_handle) = spawn_test_server(seeded_state().await).await;

        let body: serde_json::Value = reqwest::get(format!("http://{addr}/api/maps/latest"))
            .await
            .expect("latest request")
            .error_for_status()
            .expect("latest status")
            .json()
            .await
            .expect("latest json");

        let latest = body.as_array().expect("latest is an array");
        let ids: Vec<&str> = latest
            .iter()
            .filter_map(|entry| entry["map"]["id"].as_str())
            .collect();
        assert_eq!(ids, vec!["rat-v2", "rat-vagus"]);
        assert_eq!(latest[0]["key"], "NCBITaxon:10114 -- Rat");

        server_handle.abort();
    }

    #[tokio::test]
    async fn health_reports_catalog_state() {
        let state = AppState::new(PathBuf::from("maps"), PathBuf::from("client/dist"));
        let (addr, server_handle) = spawn_test_server(state.clone()).await;
        let url = format!("http://{addr}/api/health");

        let before: serde_json::Value = reqwest::get(&url)
            .await
            .expect("health request")
            .json()
            .await
            .expect("health json");
        assert_eq!(before["status"], "ok");
        assert_eq!(before["maps"], 0);
        assert_eq!(before["generation"], 0);
        assert!(before["refreshed_at"].is_null());

        state
            .replace_catalog([descriptor("rat-v1", "Rat", "2023-11-02")].into_iter().collect())
            .await
            .expect("serialize catalog");

        let after: serde_json::Value = reqwest::get(&url)
            .await
            .expect("health request")
            .json()
            .await
            .expect("health json");
        assert_eq!(after["maps"], 1);
        assert_eq!(after["generation"], 1);
        assert!(after["refreshed_at"].is_string());

        server_handle.abort();
    }
}
