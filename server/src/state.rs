use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use flatmap_shared::{MapCatalog, build_logical_groups, order_for_display};
use tokio::sync::RwLock;

/// Catalog as last scanned, with its API payloads serialized once per scan
/// and shared by all requests via Arc.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    /// Bumped whenever the scanned catalog differs from the previous one.
    pub generation: u64,
    pub catalog: MapCatalog,
    pub catalog_json: Arc<Bytes>,
    pub latest_json: Arc<Bytes>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl Default for CatalogSnapshot {
    fn default() -> Self {
        Self {
            generation: 0,
            catalog: MapCatalog::new(),
            catalog_json: Arc::new(Bytes::from_static(b"{}")),
            latest_json: Arc::new(Bytes::from_static(b"[]")),
            refreshed_at: None,
        }
    }
}

impl CatalogSnapshot {
    fn build(generation: u64, catalog: MapCatalog) -> Result<Self, serde_json::Error> {
        let catalog_json = serde_json::to_vec(&catalog).map(Bytes::from)?;
        let latest = order_for_display(&build_logical_groups(&catalog));
        let latest_json = serde_json::to_vec(&latest).map(Bytes::from)?;
        Ok(Self {
            generation,
            catalog,
            catalog_json: Arc::new(catalog_json),
            latest_json: Arc::new(latest_json),
            refreshed_at: Some(Utc::now()),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<RwLock<CatalogSnapshot>>,
    /// Root holding one directory per published map.
    pub maps_dir: PathBuf,
    /// Built client bundle.
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(maps_dir: PathBuf, static_dir: PathBuf) -> Self {
        Self {
            catalog: Arc::new(RwLock::new(CatalogSnapshot::default())),
            maps_dir,
            static_dir,
        }
    }

    /// Install a freshly scanned catalog. Returns the new generation when the
    /// catalog changed, `None` when only the refresh time moved.
    pub async fn replace_catalog(
        &self,
        catalog: MapCatalog,
    ) -> Result<Option<u64>, serde_json::Error> {
        let mut snapshot = self.catalog.write().await;
        if snapshot.refreshed_at.is_some() && snapshot.catalog == catalog {
            snapshot.refreshed_at = Some(Utc::now());
            return Ok(None);
        }

        let next = CatalogSnapshot::build(snapshot.generation + 1, catalog)?;
        let generation = next.generation;
        *snapshot = next;
        Ok(Some(generation))
    }
}
