//! Playback Commands - 播放控制命令

use serde::Serialize;
use uuid::Uuid;

/// 播放指定位置命令（位置会被钳制到有效范围）
#[derive(Debug, Clone, Copy)]
pub struct PlayIndex {
    pub index: usize,
}

/// 曲目自然结束通知
///
/// 客户端可附带结束时所播放资源的 stream id，不匹配当前绑定资源的通知被忽略
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackEnded {
    pub stream_id: Option<Uuid>,
}

/// 播放操作的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayOutcome {
    /// 已绑定并开始播放
    Started,
    /// 已绑定，但平台拒绝启动；等待用户再次触发播放
    StartRejected,
    /// 无事发生（空列表、越界的 next 等）
    Unchanged,
    /// 已到列表末尾，播放停止
    Finished,
}
