//! Library Commands - 播放列表与曲目写操作

use crate::domain::library::{PlaylistId, TrackId};

/// 创建播放列表命令
#[derive(Debug, Clone)]
pub struct CreatePlaylist {
    pub name: String,
}

/// 切换活动播放列表命令
#[derive(Debug, Clone)]
pub struct SelectPlaylist {
    pub playlist_id: PlaylistId,
}

/// 单个待导入文件（已通过外部文件类型过滤）
#[derive(Debug, Clone)]
pub struct ImportItem {
    pub file_name: String,
    pub payload: Vec<u8>,
    pub mime: String,
}

/// 导入曲目到活动播放列表命令
#[derive(Debug, Clone)]
pub struct ImportTracks {
    pub items: Vec<ImportItem>,
}

/// 导入结果
#[derive(Debug, Clone, Default)]
pub struct ImportTracksResponse {
    /// 没有活动播放列表时为 None（no-op）
    pub playlist_id: Option<PlaylistId>,
    /// 按输入顺序追加的新曲目 ID
    pub track_ids: Vec<TrackId>,
}

/// 重命名曲目命令
#[derive(Debug, Clone)]
pub struct RenameTrack {
    pub track_id: TrackId,
    pub title: String,
}

/// 在活动播放列表中移动曲目命令
#[derive(Debug, Clone, Copy)]
pub struct MoveTrack {
    pub index: usize,
    pub delta: i64,
}

/// 移动结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveTrackResponse {
    pub from: usize,
    /// 实际目标位置；与 from 相同表示 no-op
    pub to: usize,
}

impl MoveTrackResponse {
    pub fn moved(&self) -> bool {
        self.from != self.to
    }
}
