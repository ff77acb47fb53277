//! Library Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::library_manager::resolve_tracks;
use crate::application::ports::{LibraryStorePort, PlaylistRecord, StoreUsage, TrackMeta};
use crate::application::queries::{GetPlaylistTracks, GetStorageUsage};
use crate::domain::library::{PlaylistId, TrackId};

// ============================================================================
// Response DTOs
// ============================================================================

/// 播放列表摘要
#[derive(Debug, Clone)]
pub struct PlaylistSummary {
    pub id: PlaylistId,
    pub name: String,
    pub track_count: usize,
    pub created_at: String,
    pub updated_at: String,
    pub version: u64,
}

impl From<&PlaylistRecord> for PlaylistSummary {
    fn from(record: &PlaylistRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            track_count: record.track_ids.len(),
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
            version: record.version,
        }
    }
}

/// 已解析的曲目行（不含音频数据）
#[derive(Debug, Clone)]
pub struct TrackRow {
    /// 在播放列表中的位置
    pub index: usize,
    pub id: TrackId,
    pub title: String,
    pub mime: String,
    pub size_bytes: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl TrackRow {
    fn new(index: usize, track: TrackMeta) -> Self {
        Self {
            index,
            id: track.id,
            title: track.title,
            mime: track.mime,
            size_bytes: track.size_bytes,
            created_at: track.created_at.to_rfc3339(),
            updated_at: track.updated_at.to_rfc3339(),
        }
    }
}

/// 播放列表曲目响应
#[derive(Debug, Clone)]
pub struct PlaylistTracksResponse {
    pub playlist: PlaylistSummary,
    pub tracks: Vec<TrackRow>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GetPlaylistTracks Handler
pub struct GetPlaylistTracksHandler {
    store: Arc<dyn LibraryStorePort>,
}

impl GetPlaylistTracksHandler {
    pub fn new(store: Arc<dyn LibraryStorePort>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        query: GetPlaylistTracks,
    ) -> Result<PlaylistTracksResponse, ApplicationError> {
        let playlist = self
            .store
            .get_playlist(&query.playlist_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Playlist", &query.playlist_id))?;

        let tracks = resolve_tracks(self.store.as_ref(), &playlist)
            .await?
            .into_iter()
            .map(|(index, track)| TrackRow::new(index, track))
            .collect();

        Ok(PlaylistTracksResponse {
            playlist: PlaylistSummary::from(&playlist),
            tracks,
        })
    }
}

/// GetStorageUsage Handler
pub struct GetStorageUsageHandler {
    store: Arc<dyn LibraryStorePort>,
}

impl GetStorageUsageHandler {
    pub fn new(store: Arc<dyn LibraryStorePort>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, _query: GetStorageUsage) -> Result<StoreUsage, ApplicationError> {
        Ok(self.store.usage().await?)
    }
}
