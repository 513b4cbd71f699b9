//! Throwaway SQLite stores

use tempfile::TempDir;
use AdhkarBot::database::{DatabaseConfig, SettingsStore};

/// Store backed by a file in a temporary directory removed on drop
pub struct TestStore {
    pub store: SettingsStore,
    _dir: TempDir,
}

impl TestStore {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("adhkar_test.db").display());
        let config = DatabaseConfig {
            url,
            max_connections: 4,
            min_connections: 1,
            ..DatabaseConfig::default()
        };
        let store = SettingsStore::connect_with(&config).await.expect("test store");
        Self { store, _dir: dir }
    }
}
