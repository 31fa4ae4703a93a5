use flatmap_shared::MapCatalog;

/// Fetch every published map version from the map service.
pub async fn fetch_catalog(endpoint: &str) -> Result<MapCatalog, String> {
    let url = format!("{endpoint}api/maps");
    let resp = gloo_net::http::Request::get(&url)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    resp.json::<MapCatalog>()
        .await
        .map_err(|e| format!("parse error: {e}"))
}
