//! Sled-based Library Store Implementation
//!
//! 每类记录一个 tree，另有 `meta` tree 保存 schema 版本。
//! 值使用 bincode 编码，播放列表写入通过 compare_and_swap 保证版本检查与写入原子。
//! 每次写入在返回前刷盘

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sled::transaction::{ConflictableTransactionResult, TransactionError, Transactional};
use sled::{Db, IVec, Tree};
use std::path::Path;
use std::sync::Arc;

use crate::application::ports::{
    check_version, plan_migration, LibraryStorePort, PlaylistRecord, StoreError, StoreKind,
    StoreUsage, TrackMeta, TrackRecord,
};
use crate::domain::library::{PlaylistId, TrackId};

const META_TREE: &str = "meta";
const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// schema v1 的播放列表布局（无版本号）
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredPlaylistV1 {
    id: PlaylistId,
    name: String,
    track_ids: Vec<TrackId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredPlaylist {
    id: PlaylistId,
    name: String,
    track_ids: Vec<TrackId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl From<&PlaylistRecord> for StoredPlaylist {
    fn from(record: &PlaylistRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            track_ids: record.track_ids.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
            version: record.version,
        }
    }
}

impl From<StoredPlaylist> for PlaylistRecord {
    fn from(stored: StoredPlaylist) -> Self {
        Self {
            id: stored.id,
            name: stored.name,
            track_ids: stored.track_ids,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
            version: stored.version,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredTrack {
    id: TrackId,
    title: String,
    payload: Vec<u8>,
    mime: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&TrackRecord> for StoredTrack {
    fn from(record: &TrackRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            payload: record.payload.clone(),
            mime: record.mime.clone(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

impl From<StoredTrack> for TrackRecord {
    fn from(stored: StoredTrack) -> Self {
        Self {
            id: stored.id,
            title: stored.title,
            payload: stored.payload,
            mime: stored.mime,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }
}

/// 借用编码字节的曲目视图，读取元数据时不复制音频数据
#[derive(Debug, Deserialize)]
struct StoredTrackView<'a> {
    id: &'a str,
    title: &'a str,
    payload: &'a [u8],
    mime: &'a str,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<StoredTrackView<'_>> for TrackMeta {
    fn from(view: StoredTrackView<'_>) -> Self {
        Self {
            id: TrackId::from(view.id),
            title: view.title.to_string(),
            mime: view.mime.to_string(),
            size_bytes: view.payload.len() as u64,
            created_at: view.created_at,
            updated_at: view.updated_at,
        }
    }
}

fn decode_track_view(bytes: &[u8]) -> Result<StoredTrackView<'_>, StoreError> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    bincode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn stored_version(value: Option<&IVec>) -> Result<Option<u64>, StoreError> {
    value
        .map(|bytes| decode::<StoredPlaylist>(bytes).map(|p| p.version))
        .transpose()
}

/// Sled 播放列表库存储
pub struct SledLibraryStore {
    db: Db,
    playlists: Tree,
    tracks: Tree,
    schema_version: u32,
}

impl SledLibraryStore {
    /// 打开（或创建）存储，并在返回前执行所需的 schema 迁移
    pub fn open<P: AsRef<Path>>(path: P, schema_version: u32) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let db = sled::open(path).map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let meta = db
            .open_tree(META_TREE)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let stored = Self::read_schema_version(&meta)?;
        let steps = plan_migration(stored, schema_version)?;

        let playlists = db
            .open_tree(StoreKind::Playlists.as_str())
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let tracks = db
            .open_tree(StoreKind::Tracks.as_str())
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        for version in steps {
            let upgraded = if version == 2 {
                Self::add_playlist_versions(&playlists)?
            } else {
                Vec::new()
            };
            Self::commit_migration(&playlists, &meta, &upgraded, version)?;
            db.flush()
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;

            tracing::info!(from = stored, to = version, "Sled library schema migrated");
        }

        tracing::info!(
            db_path = %path.display(),
            schema_version = schema_version,
            playlists = playlists.len(),
            tracks = tracks.len(),
            "SledLibraryStore initialized"
        );

        Ok(Self {
            db,
            playlists,
            tracks,
            schema_version,
        })
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 等待写入落盘
    async fn persist(&self) -> Result<(), StoreError> {
        self.db
            .flush_async()
            .await
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        Ok(())
    }

    fn read_schema_version(meta: &Tree) -> Result<u32, StoreError> {
        let Some(bytes) = meta
            .get(SCHEMA_VERSION_KEY)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
        else {
            return Ok(0);
        };

        let raw = <[u8; 4]>::try_from(&bytes[..])
            .map_err(|_| StoreError::Unavailable("corrupt schema version".to_string()))?;
        Ok(u32::from_be_bytes(raw))
    }

    /// 迁移后的记录与 schema 版本在同一个事务中写入，中途崩溃不会重复迁移
    fn commit_migration(
        playlists: &Tree,
        meta: &Tree,
        upgraded: &[(IVec, Vec<u8>)],
        version: u32,
    ) -> Result<(), StoreError> {
        (playlists, meta)
            .transaction(|(playlists, meta)| -> ConflictableTransactionResult<(), StoreError> {
                for (key, value) in upgraded {
                    playlists.insert(&key[..], &value[..])?;
                }
                meta.insert(SCHEMA_VERSION_KEY, &version.to_be_bytes()[..])?;
                Ok(())
            })
            .map_err(|e| match e {
                TransactionError::Abort(e) => e,
                TransactionError::Storage(e) => StoreError::Unavailable(e.to_string()),
            })
    }

    /// v2: 为已有播放列表补充版本号 1，返回待写入的记录
    fn add_playlist_versions(playlists: &Tree) -> Result<Vec<(IVec, Vec<u8>)>, StoreError> {
        let mut upgraded = Vec::with_capacity(playlists.len());

        for item in playlists.iter() {
            let (key, value) = item.map_err(|e| StoreError::Unavailable(e.to_string()))?;
            let legacy: StoredPlaylistV1 = decode(&value)?;
            let record = StoredPlaylist {
                id: legacy.id,
                name: legacy.name,
                track_ids: legacy.track_ids,
                created_at: legacy.created_at,
                updated_at: legacy.updated_at,
                version: 1,
            };
            upgraded.push((key, encode(&record)?));
        }

        tracing::debug!(count = upgraded.len(), "Playlists upgraded with version token");
        Ok(upgraded)
    }
}

#[async_trait]
impl LibraryStorePort for SledLibraryStore {
    fn schema_version(&self) -> u32 {
        self.schema_version
    }

    async fn get_playlist(&self, id: &PlaylistId) -> Result<Option<PlaylistRecord>, StoreError> {
        let value = self
            .playlists
            .get(id.as_str())
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        value
            .map(|bytes| decode::<StoredPlaylist>(&bytes).map(PlaylistRecord::from))
            .transpose()
    }

    async fn get_all_playlists(&self) -> Result<Vec<PlaylistRecord>, StoreError> {
        let mut records = Vec::with_capacity(self.playlists.len());
        for item in self.playlists.iter() {
            let (_, value) = item.map_err(|e| StoreError::ReadFailed(e.to_string()))?;
            records.push(decode::<StoredPlaylist>(&value)?.into());
        }
        Ok(records)
    }

    async fn put_playlist(&self, record: &PlaylistRecord) -> Result<(), StoreError> {
        let key = record.id.as_str();
        let current = self
            .playlists
            .get(key)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        check_version(
            record,
            stored_version(current.as_ref()).map_err(StoreError::on_write)?,
        )?;

        let encoded = encode(&StoredPlaylist::from(record)).map_err(StoreError::on_write)?;
        let result = self
            .playlists
            .compare_and_swap(key, current, Some(encoded))
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        // 读取与交换之间被其他写入抢先
        if let Err(cas) = result {
            let actual = stored_version(cas.current.as_ref())
                .map_err(StoreError::on_write)?
                .unwrap_or(0);
            return Err(StoreError::VersionConflict {
                id: record.id.clone(),
                expected: record.version.saturating_sub(1),
                actual,
            });
        }

        self.persist().await?;

        tracing::debug!(playlist_id = %record.id, version = record.version, "Playlist stored");
        Ok(())
    }

    async fn get_track(&self, id: &TrackId) -> Result<Option<TrackRecord>, StoreError> {
        let value = self
            .tracks
            .get(id.as_str())
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        value
            .map(|bytes| decode::<StoredTrack>(&bytes).map(TrackRecord::from))
            .transpose()
    }

    async fn get_all_tracks(&self) -> Result<Vec<TrackRecord>, StoreError> {
        let mut records = Vec::with_capacity(self.tracks.len());
        for item in self.tracks.iter() {
            let (_, value) = item.map_err(|e| StoreError::ReadFailed(e.to_string()))?;
            records.push(decode::<StoredTrack>(&value)?.into());
        }
        Ok(records)
    }

    async fn put_track(&self, record: &TrackRecord) -> Result<(), StoreError> {
        let encoded = encode(&StoredTrack::from(record)).map_err(StoreError::on_write)?;
        self.tracks
            .insert(record.id.as_str(), encoded)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        self.persist().await?;

        tracing::debug!(
            track_id = %record.id,
            size_bytes = record.payload.len(),
            "Track stored"
        );
        Ok(())
    }

    async fn get_track_meta(&self, id: &TrackId) -> Result<Option<TrackMeta>, StoreError> {
        let value = self
            .tracks
            .get(id.as_str())
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        value
            .map(|bytes| decode_track_view(&bytes).map(TrackMeta::from))
            .transpose()
    }

    async fn usage(&self) -> Result<StoreUsage, StoreError> {
        let mut usage = StoreUsage {
            playlist_count: self.playlists.len(),
            ..StoreUsage::default()
        };
        for item in self.tracks.iter() {
            let (_, value) = item.map_err(|e| StoreError::ReadFailed(e.to_string()))?;
            usage.track_count += 1;
            usage.payload_bytes += decode_track_view(&value)?.payload.len() as u64;
        }
        Ok(usage)
    }
}
