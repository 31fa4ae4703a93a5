use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SERVER_PORT: u16 = 3000;
pub const DEFAULT_MAPS_DIR: &str = "maps";
pub const DEFAULT_STATIC_DIR: &str = "client/dist";
pub const DEFAULT_CATALOG_REFRESH_SECS: u64 = 300; // 5 minutes

/// Descriptor file expected inside each map directory.
pub const MAP_INDEX_FILE: &str = "index.json";
pub const CATALOG_CACHE_CONTROL: &str = "public, max-age=30";

pub fn server_port() -> u16 {
    std::env::var("SERVER_PORT")
        .ok()
        .and_then(|value| value.trim().parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

pub fn maps_dir() -> PathBuf {
    dir_from_env("MAPS_DIR", DEFAULT_MAPS_DIR)
}

pub fn static_dir() -> PathBuf {
    dir_from_env("STATIC_DIR", DEFAULT_STATIC_DIR)
}

pub fn catalog_refresh_interval() -> Duration {
    std::env::var("CATALOG_REFRESH_SECS")
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_CATALOG_REFRESH_SECS))
}

fn dir_from_env(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}
