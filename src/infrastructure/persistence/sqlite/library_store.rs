//! SQLite Library Store
//!
//! 播放列表的曲目顺序以 JSON 数组存储在 `track_ids` 列

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::sync::Arc;

use super::{create_pool, run_migrations, DatabaseConfig, DbPool};
use crate::application::ports::{
    LibraryStorePort, PlaylistRecord, StoreError, StoreUsage, TrackMeta, TrackRecord,
};
use crate::domain::library::{PlaylistId, TrackId};

/// SQLite 播放列表库存储
pub struct SqliteLibraryStore {
    pool: DbPool,
    schema_version: u32,
}

impl SqliteLibraryStore {
    /// 连接数据库并在返回前执行所需的 schema 迁移
    pub async fn open(config: &DatabaseConfig, schema_version: u32) -> Result<Self, StoreError> {
        let pool = create_pool(config)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        run_migrations(&pool, schema_version).await?;

        tracing::info!(
            database_url = %config.database_url,
            schema_version = schema_version,
            "SqliteLibraryStore initialized"
        );

        Ok(Self {
            pool,
            schema_version,
        })
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    async fn stored_version(&self, id: &PlaylistId) -> Result<Option<u64>, StoreError> {
        let version: Option<i64> = sqlx::query_scalar("SELECT version FROM playlists WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;
        Ok(version.map(|v| v as u64))
    }

    async fn conflict(&self, record: &PlaylistRecord) -> StoreError {
        let actual = match self.stored_version(&record.id).await {
            Ok(version) => version.unwrap_or(0),
            Err(e) => return e.on_write(),
        };
        StoreError::VersionConflict {
            id: record.id.clone(),
            expected: record.version.saturating_sub(1),
            actual,
        }
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Serialization(e.to_string()))
}

#[derive(FromRow)]
struct PlaylistRow {
    id: String,
    name: String,
    track_ids: String,
    created_at: String,
    updated_at: String,
    version: i64,
}

impl TryFrom<PlaylistRow> for PlaylistRecord {
    type Error = StoreError;

    fn try_from(row: PlaylistRow) -> Result<Self, Self::Error> {
        Ok(PlaylistRecord {
            id: PlaylistId::from(row.id),
            name: row.name,
            track_ids: serde_json::from_str(&row.track_ids)
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            version: row.version as u64,
        })
    }
}

#[derive(FromRow)]
struct TrackRow {
    id: String,
    title: String,
    payload: Vec<u8>,
    mime: String,
    created_at: String,
    updated_at: String,
}

impl TryFrom<TrackRow> for TrackRecord {
    type Error = StoreError;

    fn try_from(row: TrackRow) -> Result<Self, Self::Error> {
        Ok(TrackRecord {
            id: TrackId::from(row.id),
            title: row.title,
            payload: row.payload,
            mime: row.mime,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

#[derive(FromRow)]
struct TrackMetaRow {
    id: String,
    title: String,
    mime: String,
    size_bytes: i64,
    created_at: String,
    updated_at: String,
}

impl TryFrom<TrackMetaRow> for TrackMeta {
    type Error = StoreError;

    fn try_from(row: TrackMetaRow) -> Result<Self, Self::Error> {
        Ok(TrackMeta {
            id: TrackId::from(row.id),
            title: row.title,
            mime: row.mime,
            size_bytes: row.size_bytes as u64,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

const PLAYLIST_COLUMNS: &str = "id, name, track_ids, created_at, updated_at, version";
const TRACK_COLUMNS: &str = "id, title, payload, mime, created_at, updated_at";
const TRACK_META_COLUMNS: &str =
    "id, title, mime, length(payload) AS size_bytes, created_at, updated_at";

#[async_trait]
impl LibraryStorePort for SqliteLibraryStore {
    fn schema_version(&self) -> u32 {
        self.schema_version
    }

    async fn get_playlist(&self, id: &PlaylistId) -> Result<Option<PlaylistRecord>, StoreError> {
        let row: Option<PlaylistRow> = sqlx::query_as(&format!(
            "SELECT {} FROM playlists WHERE id = ?",
            PLAYLIST_COLUMNS
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        row.map(PlaylistRecord::try_from).transpose()
    }

    async fn get_all_playlists(&self) -> Result<Vec<PlaylistRecord>, StoreError> {
        let rows: Vec<PlaylistRow> =
            sqlx::query_as(&format!("SELECT {} FROM playlists", PLAYLIST_COLUMNS))
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        rows.into_iter().map(PlaylistRecord::try_from).collect()
    }

    async fn put_playlist(&self, record: &PlaylistRecord) -> Result<(), StoreError> {
        let track_ids = serde_json::to_string(&record.track_ids)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        // 新记录只能插入，已有记录只能在版本匹配时更新
        let result = match record.version {
            0 => return Err(self.conflict(record).await),
            1 => sqlx::query(
                r#"
                INSERT INTO playlists (id, name, track_ids, created_at, updated_at, version)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO NOTHING
                "#,
            )
            .bind(record.id.as_str())
            .bind(&record.name)
            .bind(&track_ids)
            .bind(record.created_at.to_rfc3339())
            .bind(record.updated_at.to_rfc3339())
            .bind(record.version as i64)
            .execute(&self.pool)
            .await,
            _ => sqlx::query(
                r#"
                UPDATE playlists
                SET name = ?, track_ids = ?, created_at = ?, updated_at = ?, version = ?
                WHERE id = ? AND version = ?
                "#,
            )
            .bind(&record.name)
            .bind(&track_ids)
            .bind(record.created_at.to_rfc3339())
            .bind(record.updated_at.to_rfc3339())
            .bind(record.version as i64)
            .bind(record.id.as_str())
            .bind((record.version - 1) as i64)
            .execute(&self.pool)
            .await,
        }
        .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(self.conflict(record).await);
        }

        tracing::debug!(playlist_id = %record.id, version = record.version, "Playlist stored");
        Ok(())
    }

    async fn get_track(&self, id: &TrackId) -> Result<Option<TrackRecord>, StoreError> {
        let row: Option<TrackRow> =
            sqlx::query_as(&format!("SELECT {} FROM tracks WHERE id = ?", TRACK_COLUMNS))
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        row.map(TrackRecord::try_from).transpose()
    }

    async fn get_all_tracks(&self) -> Result<Vec<TrackRecord>, StoreError> {
        let rows: Vec<TrackRow> = sqlx::query_as(&format!("SELECT {} FROM tracks", TRACK_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        rows.into_iter().map(TrackRecord::try_from).collect()
    }

    async fn put_track(&self, record: &TrackRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO tracks (id, title, payload, mime, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                payload = excluded.payload,
                mime = excluded.mime,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(record.id.as_str())
        .bind(&record.title)
        .bind(&record.payload)
        .bind(&record.mime)
        .bind(record.created_at.to_rfc3339())
        .bind(record.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::WriteFailed(e.to_string()))?;

        tracing::debug!(
            track_id = %record.id,
            size_bytes = record.payload.len(),
            "Track stored"
        );
        Ok(())
    }

    async fn get_track_meta(&self, id: &TrackId) -> Result<Option<TrackMeta>, StoreError> {
        let row: Option<TrackMetaRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tracks WHERE id = ?",
            TRACK_META_COLUMNS
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        row.map(TrackMeta::try_from).transpose()
    }

    async fn usage(&self) -> Result<StoreUsage, StoreError> {
        let (playlist_count, track_count, payload_bytes): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM playlists),
                COUNT(*),
                COALESCE(SUM(length(payload)), 0)
            FROM tracks
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::ReadFailed(e.to_string()))?;

        Ok(StoreUsage {
            playlist_count: playlist_count as usize,
            track_count: track_count as usize,
            payload_bytes: payload_bytes as u64,
        })
    }
}
