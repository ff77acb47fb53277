//! Persistence Layer - 数据持久化
//!
//! Sled 和 SQLite 存储实现，以及按配置选择后端

pub mod sled;
pub mod sqlite;

use std::sync::Arc;

pub use self::sled::SledLibraryStore;
pub use self::sqlite::SqliteLibraryStore;

use crate::application::ports::{LibraryStorePort, StoreError, CURRENT_SCHEMA_VERSION};
use crate::config::{StorageBackend, StorageConfig};
use crate::infrastructure::memory::InMemoryLibraryStore;

/// 按配置打开存储并迁移到当前 schema 版本
///
/// 失败返回 `StoreError::Unavailable`，对整个应用是致命的
pub async fn open_library_store(
    config: &StorageConfig,
) -> Result<Arc<dyn LibraryStorePort>, StoreError> {
    let store: Arc<dyn LibraryStorePort> = match config.backend {
        StorageBackend::Sled => {
            if let Some(parent) = config.path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            }
            SledLibraryStore::open(&config.path, CURRENT_SCHEMA_VERSION)?.arc()
        }
        StorageBackend::Sqlite => {
            if let Some(parent) = config.path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            }
            let db_config = sqlite::DatabaseConfig {
                database_url: config.database_url(),
                max_connections: config.max_connections,
            };
            SqliteLibraryStore::open(&db_config, CURRENT_SCHEMA_VERSION)
                .await?
                .arc()
        }
        StorageBackend::Memory => InMemoryLibraryStore::new().arc(),
    };

    tracing::info!(
        backend = config.backend.as_str(),
        schema_version = store.schema_version(),
        "Library store opened"
    );

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::PlaylistRecord;
    use crate::domain::library::PlaylistId;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_open_each_backend() {
        let dir = tempdir().unwrap();

        for (backend, name) in [
            (StorageBackend::Sled, "library.sled"),
            (StorageBackend::Sqlite, "nested/library.db"),
            (StorageBackend::Memory, ""),
        ] {
            let config = StorageConfig {
                backend,
                path: dir.path().join(name),
                ..StorageConfig::default()
            };
            let store = open_library_store(&config).await.unwrap();
            assert_eq!(store.schema_version(), CURRENT_SCHEMA_VERSION);

            let playlist = PlaylistRecord::new(PlaylistId::generate(), backend.as_str());
            store.put_playlist(&playlist).await.unwrap();
            assert_eq!(store.get_playlist(&playlist.id).await.unwrap(), Some(playlist));
        }
    }
}
