//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::ports::{StoreError, TransportError};
use crate::domain::library::{LibraryError, PlaylistId};

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 存储无法打开，启动阶段致命
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// 写入被拒绝，调用方中止且不修改内存状态
    #[error("Storage write failed: {0}")]
    StorageWriteFailed(String),

    /// 读取失败
    #[error("Storage read failed: {0}")]
    StorageReadFailed(String),

    /// 引用的记录不存在（soft-skip，非致命）
    #[error("{resource_type} not found: {id}")]
    RecordNotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 输入校验失败
    #[error("Validation rejected: {0}")]
    ValidationRejected(String),

    /// 播放列表在读取后被其他会话修改
    #[error("Playlist {playlist_id} was modified concurrently")]
    ConcurrentModification { playlist_id: PlaylistId },

    /// 传输层绑定失败
    #[error("Transport failed: {0}")]
    TransportFailed(String),

    /// 会话任务异常终止
    #[error("Task scheduling failed: {0}")]
    TaskScheduling(#[from] tokio::task::JoinError),
}

impl ApplicationError {
    /// 创建 RecordNotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl ToString) -> Self {
        Self::RecordNotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationRejected(message.into())
    }
}

impl From<StoreError> for ApplicationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => Self::StorageUnavailable(msg),
            StoreError::WriteFailed(msg) => Self::StorageWriteFailed(msg),
            StoreError::ReadFailed(msg) | StoreError::Serialization(msg) => {
                Self::StorageReadFailed(msg)
            }
            StoreError::VersionConflict { id, .. } => Self::ConcurrentModification { playlist_id: id },
        }
    }
}

impl From<LibraryError> for ApplicationError {
    fn from(err: LibraryError) -> Self {
        Self::ValidationRejected(err.to_string())
    }
}

impl From<TransportError> for ApplicationError {
    fn from(err: TransportError) -> Self {
        Self::TransportFailed(err.to_string())
    }
}
