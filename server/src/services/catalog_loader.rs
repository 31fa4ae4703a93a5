use std::io;
use std::path::Path;

use flatmap_shared::{MapCatalog, MapDescriptor};
use tracing::{info, warn};

use crate::config::{MAP_INDEX_FILE, catalog_refresh_interval};
use crate::state::AppState;

pub async fn run(state: AppState) {
    let mut interval = tokio::time::interval(catalog_refresh_interval());

    // Scan immediately on startup, then on every refresh tick
    loop {
        interval.tick().await;
        refresh(&state).await;
    }
}

/// Rescan the maps directory. A failed scan keeps the previous catalog.
pub async fn refresh(state: &AppState) {
    let catalog = match scan_maps_dir(&state.maps_dir).await {
        Ok(catalog) => catalog,
        Err(e) => {
            warn!(
                error = %e,
                dir = %state.maps_dir.display(),
                "failed to scan maps directory, keeping previous catalog"
            );
            return;
        }
    };

    let count = catalog.len();
    match state.replace_catalog(catalog).await {
        Ok(Some(generation)) => info!(maps = count, generation, "map catalog updated"),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "failed to serialize map catalog"),
    }
}

/// Read `<dir>/<map>/index.json` for every map directory, in directory name
/// order. Unreadable or malformed descriptors are skipped.
pub async fn scan_maps_dir(dir: &Path) -> io::Result<MapCatalog> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut map_dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            map_dirs.push(entry.path());
        }
    }
    map_dirs.sort();

    let mut catalog = MapCatalog::new();
    for map_dir in map_dirs {
        let index_path = map_dir.join(MAP_INDEX_FILE);
        let raw = match tokio::fs::read(&index_path).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, path = %index_path.display(), "skipping map without readable index");
                continue;
            }
        };
        let mut map: MapDescriptor = match serde_json::from_slice(&raw) {
            Ok(map) => map,
            Err(e) => {
                warn!(error = %e, path = %index_path.display(), "skipping malformed map index");
                continue;
            }
        };
        if map.id.is_empty() {
            let Some(name) = map_dir.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            map.id = name.to_string();
        }
        catalog.insert(map);
    }

    Ok(catalog)
}
