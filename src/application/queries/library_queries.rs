//! Library Queries

use crate::domain::library::PlaylistId;

/// 获取播放列表中已解析的曲目
#[derive(Debug, Clone)]
pub struct GetPlaylistTracks {
    pub playlist_id: PlaylistId,
}

/// 获取存储使用量（配额展示）
#[derive(Debug, Clone, Copy)]
pub struct GetStorageUsage;
