//! Media Transport Port - 播放传输层
//!
//! 传输层负责把曲目二进制内容变成可流式播放的资源（绑定），
//! 并启动 / 暂停 / 拆除播放。由播放序列器独占使用

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::library::TrackId;

/// Transport 错误
#[derive(Debug, Error)]
pub enum TransportError {
    /// 无法从曲目内容创建可播放资源
    #[error("Bind failed: {0}")]
    BindFailed(String),

    /// 平台拒绝启动播放（例如自动播放被阻止），属于可恢复的预期情况
    #[error("Playback start rejected: {0}")]
    StartRejected(String),
}

/// 待绑定的媒体来源
#[derive(Debug, Clone)]
pub struct MediaSource {
    pub track_id: TrackId,
    pub mime: String,
    pub payload: Vec<u8>,
}

/// 已绑定的可流式资源句柄
///
/// 有意不实现 `Clone` / `Copy`：`release` 按值消费句柄，每个句柄至多释放一次
#[derive(Debug, PartialEq, Eq)]
pub struct StreamHandle {
    id: Uuid,
    track_id: TrackId,
    mime: String,
    url: String,
}

impl StreamHandle {
    pub fn new(id: Uuid, track_id: TrackId, mime: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            track_id,
            mime: mime.into(),
            url: url.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn track_id(&self) -> &TrackId {
        &self.track_id
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Media Transport Port
#[async_trait]
pub trait MediaTransportPort: Send + Sync {
    /// 绑定新资源
    fn bind(&self, source: MediaSource) -> Result<StreamHandle, TransportError>;

    /// 释放资源
    fn release(&self, handle: StreamHandle);

    /// 尝试开始播放已绑定资源
    async fn start(&self, handle: &StreamHandle) -> Result<(), TransportError>;

    /// 暂停播放
    fn pause(&self, handle: &StreamHandle);

    /// 停止并拆除传输（暂停、卸载来源）
    fn halt(&self);
}
