//! Data Transfer Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::{
    MoveTrackResponse, PlayOutcome, PlaybackSnapshot, PlaylistSummary, PlaylistTracksResponse,
    TrackMeta, TrackRow,
};
use crate::domain::library::{PlaylistId, TrackId};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 空数据响应
#[derive(Debug, Serialize, Deserialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self::success(Empty {})
    }
}

// ============================================================================
// Playlist DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectPlaylistRequest {
    pub id: PlaylistId,
}

/// 不指定 id 时查询活动播放列表
#[derive(Debug, Default, Deserialize)]
pub struct PlaylistTracksRequest {
    #[serde(default)]
    pub id: Option<PlaylistId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlaylistResponse {
    pub id: PlaylistId,
    pub name: String,
    pub track_count: usize,
    pub version: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<PlaylistSummary> for PlaylistResponse {
    fn from(p: PlaylistSummary) -> Self {
        Self {
            id: p.id,
            name: p.name,
            track_count: p.track_count,
            version: p.version,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// 按 updated_at 倒序排列的播放列表
#[derive(Debug, Serialize, Deserialize)]
pub struct PlaylistListResponse {
    pub active_playlist_id: Option<PlaylistId>,
    pub playlists: Vec<PlaylistResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrackResponse {
    pub index: Option<usize>,
    pub id: TrackId,
    pub title: String,
    pub mime: String,
    pub size_bytes: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<TrackRow> for TrackResponse {
    fn from(t: TrackRow) -> Self {
        Self {
            index: Some(t.index),
            id: t.id,
            title: t.title,
            mime: t.mime,
            size_bytes: t.size_bytes,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

impl From<TrackMeta> for TrackResponse {
    fn from(t: TrackMeta) -> Self {
        Self {
            index: None,
            size_bytes: t.size_bytes,
            id: t.id,
            title: t.title,
            mime: t.mime,
            created_at: t.created_at.to_rfc3339(),
            updated_at: t.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlaylistTracksDto {
    pub playlist: PlaylistResponse,
    pub tracks: Vec<TrackResponse>,
}

impl From<PlaylistTracksResponse> for PlaylistTracksDto {
    fn from(r: PlaylistTracksResponse) -> Self {
        Self {
            playlist: r.playlist.into(),
            tracks: r.tracks.into_iter().map(TrackResponse::from).collect(),
        }
    }
}

// ============================================================================
// Track DTOs
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportResponse {
    /// 没有活动播放列表时为空，且不写入任何内容
    pub playlist_id: Option<PlaylistId>,
    pub track_ids: Vec<TrackId>,
    /// 未通过文件类型过滤的文件名
    pub skipped: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameTrackRequest {
    pub id: TrackId,
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct MoveTrackRequest {
    pub index: usize,
    pub delta: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MoveResponse {
    pub from: usize,
    pub to: usize,
    pub moved: bool,
}

impl From<MoveTrackResponse> for MoveResponse {
    fn from(m: MoveTrackResponse) -> Self {
        Self {
            from: m.from,
            to: m.to,
            moved: m.moved(),
        }
    }
}

// ============================================================================
// Playback DTOs
// ============================================================================

/// 不指定 index 时从当前位置或第一首开始
#[derive(Debug, Default, Deserialize)]
pub struct PlayRequest {
    #[serde(default)]
    pub index: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TrackEndedRequest {
    #[serde(default)]
    pub stream_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct PlaybackResponse {
    pub outcome: PlayOutcome,
    pub playback: PlaybackSnapshot,
}

#[derive(Debug, Serialize)]
pub struct PauseResponse {
    pub paused: bool,
    pub playback: PlaybackSnapshot,
}
