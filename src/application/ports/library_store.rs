//! Library Store Port - 出站端口
//!
//! 定义播放列表 / 曲目两类键值记录的持久化抽象
//! 具体实现在 infrastructure 层（Sled、SQLite、内存）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::ops::RangeInclusive;
use thiserror::Error;

use crate::domain::library::{PlaylistId, TrackId};

/// 当前支持的存储 schema 版本
///
/// - v1: playlists / tracks 两个键值存储
/// - v2: playlists 增加乐观并发版本号 `version`
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

/// Store 错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Write rejected: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Version conflict on playlist {id}: expected stored version {expected}, found {actual}")]
    VersionConflict {
        id: PlaylistId,
        expected: u64,
        actual: u64,
    },
}

impl StoreError {
    /// 写路径上的读取 / 编码错误报告为写入失败
    pub fn on_write(self) -> Self {
        match self {
            Self::ReadFailed(msg) | Self::Serialization(msg) => Self::WriteFailed(msg),
            other => other,
        }
    }
}

/// 两类键值存储
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    Playlists,
    Tracks,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Playlists => "playlists",
            StoreKind::Tracks => "tracks",
        }
    }
}

/// 播放列表记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRecord {
    pub id: PlaylistId,
    pub name: String,
    /// 有序曲目 ID（顺序有意义）
    pub track_ids: Vec<TrackId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// 乐观并发版本号，新建记录为 1，每次写入 +1
    pub version: u64,
}

impl PlaylistRecord {
    /// 新建空播放列表（两个时间戳相同）
    pub fn new(id: PlaylistId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            track_ids: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    /// 基于当前记录生成下一个修订：刷新 updated_at 并递增版本号
    pub fn next_revision(&self, track_ids: Vec<TrackId>) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            track_ids,
            created_at: self.created_at,
            updated_at: Utc::now(),
            version: self.version + 1,
        }
    }
}

/// 曲目记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRecord {
    pub id: TrackId,
    pub title: String,
    pub payload: Vec<u8>,
    pub mime: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrackRecord {
    pub fn new(id: TrackId, title: impl Into<String>, payload: Vec<u8>, mime: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: title.into(),
            payload,
            mime: mime.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// 曲目元数据（不含音频数据），用于列表展示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMeta {
    pub id: TrackId,
    pub title: String,
    pub mime: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&TrackRecord> for TrackMeta {
    fn from(record: &TrackRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            mime: record.mime.clone(),
            size_bytes: record.payload.len() as u64,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// 存储使用统计（供配额展示使用，只读）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreUsage {
    pub playlist_count: usize,
    pub track_count: usize,
    pub payload_bytes: u64,
}

/// 校验乐观并发版本号
///
/// 写入的记录必须恰好是存储中版本（不存在视为 0）的下一个版本
pub fn check_version(record: &PlaylistRecord, stored: Option<u64>) -> Result<(), StoreError> {
    let actual = stored.unwrap_or(0);
    if record.version == actual + 1 {
        Ok(())
    } else {
        Err(StoreError::VersionConflict {
            id: record.id.clone(),
            expected: record.version.saturating_sub(1),
            actual,
        })
    }
}

/// 计算打开存储时需要执行的迁移步骤
///
/// - 请求版本超过 `CURRENT_SCHEMA_VERSION`：不支持
/// - 请求版本低于已存储版本：拒绝降级
/// - 请求版本低于 `CURRENT_SCHEMA_VERSION`：当前记录格式无法在旧布局上运行
///
/// 返回需要依次执行的版本区间（可能为空）
pub fn plan_migration(stored: u32, requested: u32) -> Result<RangeInclusive<u32>, StoreError> {
    if requested > CURRENT_SCHEMA_VERSION {
        return Err(StoreError::Unavailable(format!(
            "schema version {} is newer than supported version {}",
            requested, CURRENT_SCHEMA_VERSION
        )));
    }
    if requested < stored {
        return Err(StoreError::Unavailable(format!(
            "refusing to downgrade schema from {} to {}",
            stored, requested
        )));
    }
    if requested < CURRENT_SCHEMA_VERSION {
        return Err(StoreError::Unavailable(format!(
            "schema version {} is older than required version {}",
            requested, CURRENT_SCHEMA_VERSION
        )));
    }
    Ok(stored + 1..=requested)
}

/// Library Store Port
///
/// - get / get_all / put，没有删除操作
/// - put 按主键 upsert 并覆盖全部字段
/// - get_all 的顺序不作保证，排序由调用方负责
#[async_trait]
pub trait LibraryStorePort: Send + Sync {
    /// 已打开存储的 schema 版本
    fn schema_version(&self) -> u32;

    async fn get_playlist(&self, id: &PlaylistId) -> Result<Option<PlaylistRecord>, StoreError>;

    async fn get_all_playlists(&self) -> Result<Vec<PlaylistRecord>, StoreError>;

    /// 写入播放列表，原子地检查并递增版本号
    ///
    /// `record.version` 必须等于存储中版本 + 1，否则返回 `VersionConflict`
    async fn put_playlist(&self, record: &PlaylistRecord) -> Result<(), StoreError>;

    async fn get_track(&self, id: &TrackId) -> Result<Option<TrackRecord>, StoreError>;

    async fn get_all_tracks(&self) -> Result<Vec<TrackRecord>, StoreError>;

    async fn put_track(&self, record: &TrackRecord) -> Result<(), StoreError>;

    /// 只读取曲目元数据。默认实现会加载音频数据，持久化后端应覆盖
    async fn get_track_meta(&self, id: &TrackId) -> Result<Option<TrackMeta>, StoreError> {
        Ok(self.get_track(id).await?.as_ref().map(TrackMeta::from))
    }

    /// 聚合使用量。默认实现会加载全部音频数据，持久化后端应覆盖
    async fn usage(&self) -> Result<StoreUsage, StoreError> {
        let playlist_count = self.get_all_playlists().await?.len();
        let tracks = self.get_all_tracks().await?;
        Ok(StoreUsage {
            playlist_count,
            track_count: tracks.len(),
            payload_bytes: tracks.iter().map(|t| t.payload.len() as u64).sum(),
        })
    }
}
