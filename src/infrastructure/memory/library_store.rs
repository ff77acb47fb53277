//! In-Memory Library Store Implementation
//!
//! 非持久化，进程退出即丢失。用于测试和 `memory` 存储后端

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

use crate::application::ports::{
    check_version, LibraryStorePort, PlaylistRecord, StoreError, StoreUsage, TrackMeta,
    TrackRecord, CURRENT_SCHEMA_VERSION,
};
use crate::domain::library::{PlaylistId, TrackId};

/// 内存存储
pub struct InMemoryLibraryStore {
    playlists: DashMap<PlaylistId, PlaylistRecord>,
    tracks: DashMap<TrackId, TrackRecord>,
}

impl InMemoryLibraryStore {
    pub fn new() -> Self {
        Self {
            playlists: DashMap::new(),
            tracks: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 模拟存储被外部篡改（曲目被移除）
    #[cfg(test)]
    pub(crate) fn remove_track_externally(&self, id: &TrackId) {
        self.tracks.remove(id);
    }
}

impl Default for InMemoryLibraryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LibraryStorePort for InMemoryLibraryStore {
    fn schema_version(&self) -> u32 {
        CURRENT_SCHEMA_VERSION
    }

    async fn get_playlist(&self, id: &PlaylistId) -> Result<Option<PlaylistRecord>, StoreError> {
        Ok(self.playlists.get(id).map(|p| p.clone()))
    }

    async fn get_all_playlists(&self) -> Result<Vec<PlaylistRecord>, StoreError> {
        Ok(self.playlists.iter().map(|e| e.value().clone()).collect())
    }

    async fn put_playlist(&self, record: &PlaylistRecord) -> Result<(), StoreError> {
        match self.playlists.entry(record.id.clone()) {
            Entry::Occupied(mut entry) => {
                check_version(record, Some(entry.get().version))?;
                entry.insert(record.clone());
            }
            Entry::Vacant(entry) => {
                check_version(record, None)?;
                entry.insert(record.clone());
            }
        }
        tracing::debug!(playlist_id = %record.id, version = record.version, "Playlist stored");
        Ok(())
    }

    async fn get_track(&self, id: &TrackId) -> Result<Option<TrackRecord>, StoreError> {
        Ok(self.tracks.get(id).map(|t| t.clone()))
    }

    async fn get_all_tracks(&self) -> Result<Vec<TrackRecord>, StoreError> {
        Ok(self.tracks.iter().map(|e| e.value().clone()).collect())
    }

    async fn put_track(&self, record: &TrackRecord) -> Result<(), StoreError> {
        self.tracks.insert(record.id.clone(), record.clone());
        tracing::debug!(track_id = %record.id, "Track stored");
        Ok(())
    }

    async fn get_track_meta(&self, id: &TrackId) -> Result<Option<TrackMeta>, StoreError> {
        Ok(self.tracks.get(id).map(|t| TrackMeta::from(t.value())))
    }

    async fn usage(&self) -> Result<StoreUsage, StoreError> {
        Ok(StoreUsage {
            playlist_count: self.playlists.len(),
            track_count: self.tracks.len(),
            payload_bytes: self
                .tracks
                .iter()
                .map(|t| t.payload.len() as u64)
                .sum(),
        })
    }
}
