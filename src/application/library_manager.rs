//! Library Manager - 播放列表缓存与写操作
//!
//! 持有按 updated_at 降序排列的播放列表缓存和活动播放列表 ID。
//! 每次写操作先写入存储，成功后从存储整体重新加载缓存，从不原地修补

use chrono::Utc;
use std::sync::Arc;

use crate::application::commands::{
    CreatePlaylist, ImportTracks, ImportTracksResponse, MoveTrack, MoveTrackResponse, RenameTrack,
};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    LibraryStorePort, PlaylistRecord, StoreError, TrackMeta, TrackRecord,
};
use crate::domain::library::{
    move_item, move_target, normalize_mime, PlaylistId, PlaylistName, TrackId, TrackTitle,
};

pub struct LibraryManager {
    store: Arc<dyn LibraryStorePort>,
    playlists: Vec<PlaylistRecord>,
    active_playlist_id: Option<PlaylistId>,
}

impl LibraryManager {
    /// 从存储加载缓存，并自动选中最近更新的播放列表
    pub async fn load(store: Arc<dyn LibraryStorePort>) -> Result<Self, ApplicationError> {
        let mut manager = Self {
            store,
            playlists: Vec::new(),
            active_playlist_id: None,
        };
        manager.reload().await?;
        manager.active_playlist_id = manager.playlists.first().map(|p| p.id.clone());

        tracing::info!(
            playlists = manager.playlists.len(),
            active = ?manager.active_playlist_id.as_ref().map(|id| id.as_str()),
            "Library loaded"
        );

        Ok(manager)
    }

    pub fn store(&self) -> &Arc<dyn LibraryStorePort> {
        &self.store
    }

    /// 播放列表缓存（最近更新在前）
    pub fn playlists(&self) -> &[PlaylistRecord] {
        &self.playlists
    }

    pub fn active_playlist_id(&self) -> Option<&PlaylistId> {
        self.active_playlist_id.as_ref()
    }

    pub fn active_playlist(&self) -> Option<&PlaylistRecord> {
        let id = self.active_playlist_id.as_ref()?;
        self.find_playlist(id)
    }

    pub fn find_playlist(&self, id: &PlaylistId) -> Option<&PlaylistRecord> {
        self.playlists.iter().find(|p| &p.id == id)
    }

    /// 从存储整体重新加载并排序
    pub async fn reload(&mut self) -> Result<(), ApplicationError> {
        let mut playlists = self.store.get_all_playlists().await?;
        playlists.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        self.playlists = playlists;
        Ok(())
    }

    /// 创建播放列表并设为活动列表
    ///
    /// 空名称返回 `ValidationRejected`，不写入任何内容
    pub async fn create_playlist(
        &mut self,
        cmd: CreatePlaylist,
    ) -> Result<PlaylistRecord, ApplicationError> {
        let name = PlaylistName::new(&cmd.name)?;
        let record = PlaylistRecord::new(PlaylistId::generate(), name.into_inner());

        self.write_playlist(&record).await?;
        self.active_playlist_id = Some(record.id.clone());

        tracing::info!(playlist_id = %record.id, name = %record.name, "Playlist created");
        Ok(record)
    }

    /// 切换活动播放列表。ID 不在缓存中时返回 `RecordNotFound` 且不做任何修改
    pub fn set_active(&mut self, id: &PlaylistId) -> Result<(), ApplicationError> {
        if self.find_playlist(id).is_none() {
            return Err(ApplicationError::not_found("Playlist", id));
        }
        self.active_playlist_id = Some(id.clone());
        tracing::debug!(playlist_id = %id, "Active playlist switched");
        Ok(())
    }

    /// 导入曲目并按输入顺序追加到活动播放列表
    ///
    /// 先逐个写入曲目，全部成功后只写一次播放列表。
    /// 任一曲目写入失败则中止，播放列表保持不变（已写入的曲目成为无引用的孤儿）
    pub async fn import_tracks(
        &mut self,
        cmd: ImportTracks,
    ) -> Result<ImportTracksResponse, ApplicationError> {
        let Some(playlist_id) = self.active_playlist_id.clone() else {
            tracing::debug!("Import ignored: no active playlist");
            return Ok(ImportTracksResponse::default());
        };

        if cmd.items.is_empty() {
            return Ok(ImportTracksResponse {
                playlist_id: Some(playlist_id),
                track_ids: Vec::new(),
            });
        }

        let mut new_ids = Vec::with_capacity(cmd.items.len());
        for item in cmd.items {
            let title = TrackTitle::from_file_name(&item.file_name);
            let track = TrackRecord::new(
                TrackId::generate(),
                title.into_inner(),
                item.payload,
                normalize_mime(&item.mime),
            );

            if let Err(e) = self.store.put_track(&track).await {
                tracing::warn!(
                    playlist_id = %playlist_id,
                    file_name = %item.file_name,
                    orphaned = new_ids.len(),
                    error = %e,
                    "Import aborted, playlist left unchanged"
                );
                return Err(e.into());
            }

            tracing::debug!(track_id = %track.id, title = %track.title, "Track imported");
            new_ids.push(track.id);
        }

        let current = self
            .store
            .get_playlist(&playlist_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Playlist", &playlist_id))?;

        let mut track_ids = current.track_ids.clone();
        track_ids.extend(new_ids.iter().cloned());
        self.write_playlist(&current.next_revision(track_ids)).await?;

        tracing::info!(
            playlist_id = %playlist_id,
            count = new_ids.len(),
            "Tracks appended to playlist"
        );

        Ok(ImportTracksResponse {
            playlist_id: Some(playlist_id),
            track_ids: new_ids,
        })
    }

    /// 重命名曲目，只修改 title 和 updated_at
    pub async fn rename_track(&mut self, cmd: RenameTrack) -> Result<TrackRecord, ApplicationError> {
        let title = TrackTitle::from_input(&cmd.title);

        let mut track = self
            .store
            .get_track(&cmd.track_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Track", &cmd.track_id))?;

        track.title = title.into_inner();
        track.updated_at = Utc::now();

        self.store.put_track(&track).await?;
        self.reload().await?;

        tracing::info!(track_id = %track.id, title = %track.title, "Track renamed");
        Ok(track)
    }

    /// 在活动播放列表中移动曲目
    ///
    /// 写入基于缓存中该列表的版本：缓存过期时返回 `ConcurrentModification`。
    /// 游标修正由持有播放状态的调用方负责
    pub async fn move_track(&mut self, cmd: MoveTrack) -> Result<MoveTrackResponse, ApplicationError> {
        let unchanged = MoveTrackResponse {
            from: cmd.index,
            to: cmd.index,
        };

        let Some(playlist) = self.active_playlist().cloned() else {
            return Ok(unchanged);
        };

        let Some(target) = move_target(playlist.track_ids.len(), cmd.index, cmd.delta)? else {
            return Ok(unchanged);
        };

        let mut track_ids = playlist.track_ids.clone();
        move_item(&mut track_ids, cmd.index, target);
        self.write_playlist(&playlist.next_revision(track_ids)).await?;

        tracing::info!(
            playlist_id = %playlist.id,
            from = cmd.index,
            to = target,
            "Track moved"
        );

        Ok(MoveTrackResponse {
            from: cmd.index,
            to: target,
        })
    }

    /// 写入播放列表后重新加载缓存
    ///
    /// 版本冲突时同样重新加载，使缓存反映其他会话的写入
    async fn write_playlist(&mut self, record: &PlaylistRecord) -> Result<(), ApplicationError> {
        match self.store.put_playlist(record).await {
            Ok(()) => self.reload().await,
            Err(StoreError::VersionConflict { id, expected, actual }) => {
                tracing::warn!(
                    playlist_id = %id,
                    expected = expected,
                    actual = actual,
                    "Playlist modified concurrently, write rejected"
                );
                if let Err(e) = self.reload().await {
                    tracing::warn!(error = %e, "Reload after conflict failed");
                }
                Err(ApplicationError::ConcurrentModification { playlist_id: id })
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// 按顺序解析播放列表中的曲目，返回 (位置, 记录)
///
/// 存储中缺失的曲目被跳过（soft-skip），位置仍对应原列表。只读取元数据
pub async fn resolve_tracks(
    store: &dyn LibraryStorePort,
    playlist: &PlaylistRecord,
) -> Result<Vec<(usize, TrackMeta)>, ApplicationError> {
    let mut rows = Vec::with_capacity(playlist.track_ids.len());
    for (index, id) in playlist.track_ids.iter().enumerate() {
        match store.get_track_meta(id).await? {
            Some(track) => rows.push((index, track)),
            None => {
                tracing::warn!(playlist_id = %playlist.id, track_id = %id, "Track missing, skipped");
            }
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::application::commands::ImportItem;
    use crate::application::ports::StoreError;
    use crate::domain::library::{DEFAULT_MIME, UNTITLED};
    use crate::infrastructure::memory::InMemoryLibraryStore;

    fn item(name: &str) -> ImportItem {
        ImportItem {
            file_name: name.to_string(),
            payload: name.as_bytes().to_vec(),
            mime: "audio/mpeg".to_string(),
        }
    }

    async fn manager_with_playlist(store: Arc<dyn LibraryStorePort>) -> LibraryManager {
        let mut manager = LibraryManager::load(store).await.unwrap();
        manager
            .create_playlist(CreatePlaylist { name: "A".into() })
            .await
            .unwrap();
        manager
    }

    async fn titles(manager: &LibraryManager) -> Vec<String> {
        let mut titles = Vec::new();
        for id in &manager.active_playlist().unwrap().track_ids {
            titles.push(manager.store().get_track(id).await.unwrap().unwrap().title);
        }
        titles
    }

    /// 前 N 次曲目写入成功，之后全部失败
    struct FailingStore {
        inner: InMemoryLibraryStore,
        track_writes_left: AtomicUsize,
    }

    #[async_trait]
    impl LibraryStorePort for FailingStore {
        fn schema_version(&self) -> u32 {
            self.inner.schema_version()
        }

        async fn get_playlist(&self, id: &PlaylistId) -> Result<Option<PlaylistRecord>, StoreError> {
            self.inner.get_playlist(id).await
        }

        async fn get_all_playlists(&self) -> Result<Vec<PlaylistRecord>, StoreError> {
            self.inner.get_all_playlists().await
        }

        async fn put_playlist(&self, record: &PlaylistRecord) -> Result<(), StoreError> {
            self.inner.put_playlist(record).await
        }

        async fn get_track(&self, id: &TrackId) -> Result<Option<TrackRecord>, StoreError> {
            self.inner.get_track(id).await
        }

        async fn get_all_tracks(&self) -> Result<Vec<TrackRecord>, StoreError> {
            self.inner.get_all_tracks().await
        }

        async fn put_track(&self, record: &TrackRecord) -> Result<(), StoreError> {
            let left = self.track_writes_left.load(Ordering::SeqCst);
            if left == 0 {
                return Err(StoreError::WriteFailed("quota exceeded".into()));
            }
            self.track_writes_left.store(left - 1, Ordering::SeqCst);
            self.inner.put_track(record).await
        }
    }

    #[tokio::test]
    async fn test_create_playlist_rejects_blank_name() {
        let store = InMemoryLibraryStore::new().arc();
        let mut manager = LibraryManager::load(store.clone()).await.unwrap();

        let err = manager
            .create_playlist(CreatePlaylist { name: "   ".into() })
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::ValidationRejected(_)));
        assert!(store.get_all_playlists().await.unwrap().is_empty());
        assert!(manager.active_playlist_id().is_none());
    }

    #[tokio::test]
    async fn test_create_playlist_activates_and_sorts_recent_first() {
        let store = InMemoryLibraryStore::new().arc();
        let mut manager = LibraryManager::load(store).await.unwrap();

        let a = manager
            .create_playlist(CreatePlaylist { name: " A ".into() })
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let b = manager
            .create_playlist(CreatePlaylist { name: "B".into() })
            .await
            .unwrap();

        assert_eq!(a.name, "A");
        assert!(a.track_ids.is_empty());
        assert_eq!(manager.active_playlist_id(), Some(&b.id));
        let order: Vec<_> = manager.playlists().iter().map(|p| p.id.clone()).collect();
        assert_eq!(order, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn test_load_selects_most_recent_playlist() {
        let store = InMemoryLibraryStore::new().arc();
        let mut first = LibraryManager::load(store.clone()).await.unwrap();
        first
            .create_playlist(CreatePlaylist { name: "old".into() })
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        let recent = first
            .create_playlist(CreatePlaylist { name: "recent".into() })
            .await
            .unwrap();

        let reopened = LibraryManager::load(store).await.unwrap();
        assert_eq!(reopened.active_playlist_id(), Some(&recent.id));
    }

    #[tokio::test]
    async fn test_set_active_unknown_playlist() {
        let store = InMemoryLibraryStore::new().arc();
        let mut manager = manager_with_playlist(store).await;
        let active = manager.active_playlist_id().cloned();

        let err = manager.set_active(&PlaylistId::from("pl_missing")).unwrap_err();
        assert!(matches!(err, ApplicationError::RecordNotFound { .. }));
        assert_eq!(manager.active_playlist_id().cloned(), active);
    }

    #[tokio::test]
    async fn test_import_appends_in_order_with_default_titles() {
        let store = InMemoryLibraryStore::new().arc();
        let mut manager = manager_with_playlist(store).await;

        let mut untyped = item(".mp3");
        untyped.mime = String::new();

        let result = manager
            .import_tracks(ImportTracks {
                items: vec![item("a.mp3"), item("b.side.mp3"), untyped],
            })
            .await
            .unwrap();

        assert_eq!(result.track_ids.len(), 3);
        let playlist = manager.active_playlist().unwrap();
        assert_eq!(playlist.track_ids, result.track_ids);
        assert_eq!(playlist.version, 2);
        assert_eq!(titles(&manager).await, vec!["a", "b.side", UNTITLED]);

        let last = manager.store().get_track(&result.track_ids[2]).await.unwrap().unwrap();
        assert_eq!(last.mime, DEFAULT_MIME);
        assert_eq!(last.payload, b".mp3".to_vec());
    }

    #[tokio::test]
    async fn test_import_twice_appends_after_existing() {
        let store = InMemoryLibraryStore::new().arc();
        let mut manager = manager_with_playlist(store).await;

        let first = manager
            .import_tracks(ImportTracks { items: vec![item("a.mp3")] })
            .await
            .unwrap();
        let second = manager
            .import_tracks(ImportTracks { items: vec![item("b.mp3"), item("c.mp3")] })
            .await
            .unwrap();

        let mut expected = first.track_ids.clone();
        expected.extend(second.track_ids);
        assert_eq!(manager.active_playlist().unwrap().track_ids, expected);
    }

    #[tokio::test]
    async fn test_import_without_active_playlist_is_noop() {
        let store = InMemoryLibraryStore::new().arc();
        let mut manager = LibraryManager::load(store.clone()).await.unwrap();

        let result = manager
            .import_tracks(ImportTracks { items: vec![item("a.mp3")] })
            .await
            .unwrap();

        assert!(result.playlist_id.is_none());
        assert!(result.track_ids.is_empty());
        assert!(store.get_all_tracks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_failure_leaves_playlist_untouched() {
        let store = Arc::new(FailingStore {
            inner: InMemoryLibraryStore::new(),
            track_writes_left: AtomicUsize::new(1),
        });
        let mut manager = manager_with_playlist(store.clone()).await;
        let before = manager.active_playlist().cloned().unwrap();

        let err = manager
            .import_tracks(ImportTracks {
                items: vec![item("a.mp3"), item("b.mp3"), item("c.mp3")],
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::StorageWriteFailed(_)));
        let stored = store.get_playlist(&before.id).await.unwrap().unwrap();
        assert_eq!(stored, before);
        assert_eq!(manager.active_playlist(), Some(&before));
        // 第一首已写入，成为无引用的孤儿
        assert_eq!(store.get_all_tracks().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rename_blank_title_becomes_untitled() {
        let store = InMemoryLibraryStore::new().arc();
        let mut manager = manager_with_playlist(store).await;
        let imported = manager
            .import_tracks(ImportTracks { items: vec![item("a.mp3")] })
            .await
            .unwrap();
        let id = imported.track_ids[0].clone();
        let before = manager.store().get_track(&id).await.unwrap().unwrap();

        let renamed = manager
            .rename_track(RenameTrack {
                track_id: id.clone(),
                title: " \t ".into(),
            })
            .await
            .unwrap();

        assert_eq!(renamed.title, UNTITLED);
        let stored = manager.store().get_track(&id).await.unwrap().unwrap();
        assert_eq!(stored.title, UNTITLED);
        assert_eq!(stored.payload, before.payload);
        assert_eq!(stored.mime, before.mime);
        assert_eq!(stored.created_at, before.created_at);
        assert!(stored.updated_at >= before.updated_at);
    }

    #[tokio::test]
    async fn test_rename_trims_title() {
        let store = InMemoryLibraryStore::new().arc();
        let mut manager = manager_with_playlist(store).await;
        let imported = manager
            .import_tracks(ImportTracks { items: vec![item("a.mp3")] })
            .await
            .unwrap();

        let renamed = manager
            .rename_track(RenameTrack {
                track_id: imported.track_ids[0].clone(),
                title: "  Opening  ".into(),
            })
            .await
            .unwrap();
        assert_eq!(renamed.title, "Opening");
    }

    #[tokio::test]
    async fn test_rename_missing_track() {
        let store = InMemoryLibraryStore::new().arc();
        let mut manager = manager_with_playlist(store).await;

        let err = manager
            .rename_track(RenameTrack {
                track_id: TrackId::from("tr_missing"),
                title: "x".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::RecordNotFound { .. }));
    }

    #[tokio::test]
    async fn test_move_track_reorders_and_persists() {
        let store = InMemoryLibraryStore::new().arc();
        let mut manager = manager_with_playlist(store.clone()).await;
        manager
            .import_tracks(ImportTracks {
                items: vec![item("a.mp3"), item("b.mp3"), item("c.mp3")],
            })
            .await
            .unwrap();

        let result = manager.move_track(MoveTrack { index: 0, delta: 1 }).await.unwrap();
        assert_eq!(result, MoveTrackResponse { from: 0, to: 1 });
        assert_eq!(titles(&manager).await, vec!["b", "a", "c"]);

        let id = manager.active_playlist_id().cloned().unwrap();
        let stored = store.get_playlist(&id).await.unwrap().unwrap();
        assert_eq!(&stored, manager.active_playlist().unwrap());
    }

    #[tokio::test]
    async fn test_move_at_boundaries_writes_nothing() {
        let store = InMemoryLibraryStore::new().arc();
        let mut manager = manager_with_playlist(store).await;
        manager
            .import_tracks(ImportTracks {
                items: vec![item("a.mp3"), item("b.mp3"), item("c.mp3")],
            })
            .await
            .unwrap();
        let before = manager.active_playlist().cloned().unwrap();

        let up = manager.move_track(MoveTrack { index: 0, delta: -1 }).await.unwrap();
        let down = manager.move_track(MoveTrack { index: 2, delta: 1 }).await.unwrap();

        assert!(!up.moved());
        assert!(!down.moved());
        assert_eq!(manager.active_playlist(), Some(&before));
    }

    #[tokio::test]
    async fn test_move_out_of_range_index_rejected() {
        let store = InMemoryLibraryStore::new().arc();
        let mut manager = manager_with_playlist(store).await;

        let err = manager.move_track(MoveTrack { index: 0, delta: 1 }).await.unwrap_err();
        assert!(matches!(err, ApplicationError::ValidationRejected(_)));
    }

    #[tokio::test]
    async fn test_stale_session_write_is_rejected() {
        let store = InMemoryLibraryStore::new().arc();
        let mut first = manager_with_playlist(store.clone()).await;
        first
            .import_tracks(ImportTracks {
                items: vec![item("a.mp3"), item("b.mp3"), item("c.mp3")],
            })
            .await
            .unwrap();

        let mut second = LibraryManager::load(store.clone()).await.unwrap();
        first.move_track(MoveTrack { index: 0, delta: 1 }).await.unwrap();

        let err = second.move_track(MoveTrack { index: 2, delta: -1 }).await.unwrap_err();
        assert!(matches!(err, ApplicationError::ConcurrentModification { .. }));

        // 冲突后缓存已与存储一致
        assert_eq!(second.active_playlist(), first.active_playlist());
        assert_eq!(titles(&second).await, vec!["b", "a", "c"]);

        // 基于新缓存的重试成功
        second.move_track(MoveTrack { index: 2, delta: -1 }).await.unwrap();
        assert_eq!(titles(&second).await, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_import_reads_fresh_record_before_append() {
        let store = InMemoryLibraryStore::new().arc();
        let mut first = manager_with_playlist(store.clone()).await;
        let mut second = LibraryManager::load(store.clone()).await.unwrap();

        first
            .import_tracks(ImportTracks { items: vec![item("a.mp3")] })
            .await
            .unwrap();
        second
            .import_tracks(ImportTracks { items: vec![item("b.mp3")] })
            .await
            .unwrap();

        assert_eq!(titles(&second).await, vec!["a", "b"]);
    }
}
