//! Library Session - 播放列表库与播放序列器的组合
//!
//! 应用根持有唯一的会话（`Arc<tokio::sync::Mutex<LibrarySession>>`），
//! 所有外部触发按顺序串行执行。跨组件规则在这里落地：
//! - 新建 / 切换播放列表会停止播放并把游标重置为 none
//! - 移动曲目成功后修正游标，使其仍指向同一首曲目
//! - 重命名正在播放的曲目会刷新 "正在播放" 投影
//!
//! 写操作经 `SharedSession::run` 在独立任务中执行：请求被取消时，
//! 已提交的存储写入与随后的游标修正仍会一起完成

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, OwnedMutexGuard};

use crate::application::commands::{
    CreatePlaylist, ImportTracks, ImportTracksResponse, MoveTrack, MoveTrackResponse, PlayIndex,
    PlayOutcome, RenameTrack, SelectPlaylist, TrackEnded,
};
use crate::application::error::ApplicationError;
use crate::application::library_manager::LibraryManager;
use crate::application::ports::{
    LibraryStorePort, MediaTransportPort, PlaylistRecord, TrackRecord,
};
use crate::application::sequencer::{PlaybackSequencer, PlaybackSnapshot};
use crate::domain::library::TrackId;
use crate::infrastructure::events::{EventPublisher, PlayerEvent};

pub struct LibrarySession {
    library: LibraryManager,
    sequencer: PlaybackSequencer,
    publisher: Arc<EventPublisher>,
    last_active: bool,
}

impl LibrarySession {
    /// 加载播放列表库并创建序列器
    pub async fn open(
        store: Arc<dyn LibraryStorePort>,
        transport: Arc<dyn MediaTransportPort>,
        publisher: Arc<EventPublisher>,
    ) -> Result<Self, ApplicationError> {
        let library = LibraryManager::load(store).await?;
        Ok(Self {
            library,
            sequencer: PlaybackSequencer::new(transport),
            publisher,
            last_active: false,
        })
    }

    pub fn library(&self) -> &LibraryManager {
        &self.library
    }

    pub fn store(&self) -> Arc<dyn LibraryStorePort> {
        self.library.store().clone()
    }

    pub fn playback(&self) -> PlaybackSnapshot {
        self.sequencer.snapshot(self.track_count())
    }

    // ========================================================================
    // Library intents
    // ========================================================================

    pub async fn create_playlist(
        &mut self,
        cmd: CreatePlaylist,
    ) -> Result<PlaylistRecord, ApplicationError> {
        let record = self.library.create_playlist(cmd).await?;
        self.sequencer.reset();
        self.publisher.publish_library_changed(Some(&record.id));
        self.publish_playback();
        Ok(record)
    }

    pub fn select_playlist(&mut self, cmd: SelectPlaylist) -> Result<(), ApplicationError> {
        self.library.set_active(&cmd.playlist_id)?;
        self.sequencer.reset();
        self.publish_playback();
        Ok(())
    }

    pub async fn import_tracks(
        &mut self,
        cmd: ImportTracks,
    ) -> Result<ImportTracksResponse, ApplicationError> {
        let result = self.library.import_tracks(cmd).await;
        // 冲突等错误后缓存已重新加载，客户端同样需要刷新
        self.publisher
            .publish_library_changed(self.library.active_playlist_id());
        result
    }

    pub async fn rename_track(&mut self, cmd: RenameTrack) -> Result<TrackRecord, ApplicationError> {
        let track = self.library.rename_track(cmd).await?;
        self.publisher
            .publish_library_changed(self.library.active_playlist_id());
        if self.sequencer.refresh_title(&track.id, &track.title) {
            self.publish_now_playing();
        }
        Ok(track)
    }

    pub async fn move_track(&mut self, cmd: MoveTrack) -> Result<MoveTrackResponse, ApplicationError> {
        let result = self.library.move_track(cmd).await;

        match &result {
            Ok(moved) if moved.moved() => {
                self.sequencer.adjust_for_move(moved.from, moved.to);
                self.publisher
                    .publish_library_changed(self.library.active_playlist_id());
                self.publish_playback();
            }
            Err(ApplicationError::ConcurrentModification { .. }) => {
                self.sequencer.relocate(active_track_ids(&self.library));
                self.publish_playback();
                self.publisher
                    .publish_library_changed(self.library.active_playlist_id());
            }
            _ => {}
        }

        result
    }

    // ========================================================================
    // Playback intents
    // ========================================================================

    /// 播放指定位置；未指定时从当前位置或第一首开始
    pub async fn play(&mut self, index: Option<PlayIndex>) -> Result<PlayOutcome, ApplicationError> {
        let track_ids = active_track_ids(&self.library);
        let store = self.library.store().as_ref();
        let result = match index {
            Some(cmd) => self.sequencer.play_index(track_ids, store, cmd.index).await,
            None => self.sequencer.play_current_or_first(track_ids, store).await,
        };
        self.publish_playback();
        result
    }

    pub async fn next(&mut self) -> Result<PlayOutcome, ApplicationError> {
        let track_ids = active_track_ids(&self.library);
        let result = self
            .sequencer
            .next(track_ids, self.library.store().as_ref())
            .await;
        self.publish_playback();
        result
    }

    pub async fn prev(&mut self) -> Result<PlayOutcome, ApplicationError> {
        let track_ids = active_track_ids(&self.library);
        let result = self
            .sequencer
            .prev(track_ids, self.library.store().as_ref())
            .await;
        self.publish_playback();
        result
    }

    pub async fn track_ended(&mut self, cmd: TrackEnded) -> Result<PlayOutcome, ApplicationError> {
        let track_ids = active_track_ids(&self.library);
        let result = self
            .sequencer
            .on_ended(track_ids, self.library.store().as_ref(), cmd.stream_id)
            .await;
        self.publish_playback();
        result
    }

    pub fn pause(&mut self) -> bool {
        let paused = self.sequencer.pause();
        if paused {
            self.publish_playback();
        }
        paused
    }

    pub fn stop(&mut self) {
        self.sequencer.stop();
        self.publish_playback();
    }

    // ========================================================================
    // Events
    // ========================================================================

    fn track_count(&self) -> usize {
        active_track_ids(&self.library).len()
    }

    fn publish_now_playing(&self) {
        let now_playing = self.sequencer.now_playing();
        self.publisher.publish(PlayerEvent::NowPlaying {
            track_id: now_playing.map(|n| n.track_id.clone()),
            title: now_playing.map(|n| n.title.clone()),
            index: now_playing.map(|n| n.index),
        });
    }

    fn publish_playback(&mut self) {
        let snapshot = self.playback();
        self.publish_now_playing();
        self.publisher.publish(PlayerEvent::PlaybackChanged {
            state: snapshot.state,
            cursor: snapshot.cursor,
        });

        if snapshot.active != self.last_active {
            self.last_active = snapshot.active;
            self.publisher.publish(PlayerEvent::PlaybackActive {
                active: snapshot.active,
            });
        }
    }
}

/// 应用根持有的唯一会话
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<LibrarySession>>,
}

impl SharedSession {
    pub fn new(session: LibrarySession) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// 只读访问，以及不跨 await 的同步操作
    pub async fn lock(&self) -> MutexGuard<'_, LibrarySession> {
        self.inner.lock().await
    }

    /// 在独立任务中持锁执行一次操作，调用方被取消不会中断它
    pub async fn run<T, F, Fut>(&self, op: F) -> Result<T, ApplicationError>
    where
        F: FnOnce(OwnedMutexGuard<LibrarySession>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ApplicationError>> + Send + 'static,
        T: Send + 'static,
    {
        let inner = self.inner.clone();
        tokio::spawn(async move { op(inner.lock_owned().await).await }).await?
    }
}

fn active_track_ids(library: &LibraryManager) -> &[TrackId] {
    library
        .active_playlist()
        .map(|p| p.track_ids.as_slice())
        .unwrap_or(&[])
}
