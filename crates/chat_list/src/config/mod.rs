use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::info;

use crate::error::ChatListError;

/// Global configuration instance
static CONFIG: OnceCell<RwLock<ListConfig>> = OnceCell::new();

/// Upper bound on row changes handled incrementally. Larger change sets
/// (and larger cache-miss batches) take the slow, robust path instead.
pub const DEFAULT_MAX_INCREMENTAL_ROW_CHANGES: usize = 200;

pub const DEFAULT_HYDRATION_CACHE_CAPACITY: usize = 1024;

/// Chat list configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListConfig {
    /// Maximum number of cache misses fetched in one bulk query, and the
    /// largest dirty set accepted for an incremental update
    #[serde(default = "default_max_incremental_row_changes")]
    pub max_incremental_row_changes: usize,

    /// Number of hydrated conversations kept in memory between builds
    #[serde(default = "default_hydration_cache_capacity")]
    pub hydration_cache_capacity: usize,

    /// SQLite database backing the conversation store
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

fn default_max_incremental_row_changes() -> usize {
    DEFAULT_MAX_INCREMENTAL_ROW_CHANGES
}

fn default_hydration_cache_capacity() -> usize {
    DEFAULT_HYDRATION_CACHE_CAPACITY
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            max_incremental_row_changes: DEFAULT_MAX_INCREMENTAL_ROW_CHANGES,
            hydration_cache_capacity: DEFAULT_HYDRATION_CACHE_CAPACITY,
            database_path: None,
        }
    }
}

impl ListConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ChatListError> {
        let config: ListConfig = toml::from_str(content)
            .map_err(|e| ChatListError::Config(format!("Failed to parse config: {}", e)))?;

        if config.max_incremental_row_changes == 0 {
            return Err(ChatListError::Config(
                "max_incremental_row_changes must be greater than zero".into(),
            ));
        }
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ChatListError> {
        info!("Loading configuration from: {:?}", path);

        let content = fs::read_to_string(path)
            .map_err(|e| ChatListError::Config(format!("Failed to read config: {}", e)))?;

        Self::from_toml_str(&content)
    }
}

/// Get default config paths
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // XDG config path
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("chat-list").join("config.toml"));
    }

    // Home directory fallback
    if let Some(home_dir) = dirs::home_dir() {
        paths.push(
            home_dir
                .join(".config")
                .join("chat-list")
                .join("config.toml"),
        );
    }

    paths
}

/// Initialize configuration from default paths
pub fn init_config() -> Result<(), ChatListError> {
    for path in default_config_paths() {
        if path.exists() {
            info!("Found config at: {:?}", path);
            return init_config_from_path(&path);
        }
    }

    info!("No config file found, using defaults");
    set_config(ListConfig::default())
}

/// Initialize configuration from a specific path
pub fn init_config_from_path(path: &Path) -> Result<(), ChatListError> {
    let config = ListConfig::load_from_path(path)?;
    set_config(config)
}

/// Set the global configuration
pub fn set_config(config: ListConfig) -> Result<(), ChatListError> {
    match CONFIG.get() {
        Some(lock) => {
            let mut guard = lock
                .write()
                .map_err(|e| ChatListError::Config(format!("Failed to lock config: {}", e)))?;
            *guard = config;
        }
        None => {
            CONFIG.set(RwLock::new(config)).ok();
        }
    }
    Ok(())
}

/// Current global configuration, or defaults if never initialized
pub fn config() -> ListConfig {
    CONFIG
        .get()
        .and_then(|lock| lock.read().ok().map(|guard| guard.clone()))
        .unwrap_or_default()
}

/// Check if configuration is initialized
pub fn is_initialized() -> bool {
    CONFIG.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_fields_missing() {
        let config = ListConfig::from_toml_str("").unwrap();
        assert_eq!(config, ListConfig::default());
        assert_eq!(config.max_incremental_row_changes, 200);
    }

    #[test]
    fn test_parse_overrides() {
        let config = ListConfig::from_toml_str(
            "max_incremental_row_changes = 50\nhydration_cache_capacity = 10\ndatabase_path = \"/tmp/chats.db\"\n",
        )
        .unwrap();
        assert_eq!(config.max_incremental_row_changes, 50);
        assert_eq!(config.hydration_cache_capacity, 10);
        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/chats.db")));
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let err = ListConfig::from_toml_str("max_incremental_row_changes = 0").unwrap_err();
        assert!(matches!(err, ChatListError::Config(_)));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(ListConfig::from_toml_str("max_incremental_row_changes = \"many\"").is_err());
    }

    #[test]
    fn test_load_from_path_and_global() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "hydration_cache_capacity = 7").unwrap();

        let loaded = ListConfig::load_from_path(file.path()).unwrap();
        assert_eq!(loaded.hydration_cache_capacity, 7);

        init_config_from_path(file.path()).unwrap();
        assert!(is_initialized());
        assert_eq!(config().hydration_cache_capacity, 7);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = ListConfig::load_from_path(Path::new("/nonexistent/chat-list.toml")).unwrap_err();
        assert!(matches!(err, ChatListError::Config(_)));
    }
}
