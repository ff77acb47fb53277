//! Playback Sequencer - 播放序列器
//!
//! 独占传输层：维护游标、当前绑定资源和 "正在播放" 投影。
//! 每次切换曲目都先释放旧资源再绑定新资源

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::PlayOutcome;
use crate::application::error::ApplicationError;
use crate::application::ports::{
    LibraryStorePort, MediaSource, MediaTransportPort, StreamHandle, TransportError,
};
use crate::domain::library::TrackId;
use crate::domain::playback::{clamp_index, Cursor, PlaybackState, TransportStatus};

/// "正在播放" 投影
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NowPlaying {
    pub track_id: TrackId,
    pub title: String,
    pub index: usize,
}

/// 播放状态快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub cursor: Option<usize>,
    pub now_playing: Option<NowPlaying>,
    pub stream_id: Option<Uuid>,
    pub stream_url: Option<String>,
    pub mime: Option<String>,
    /// 是否处于实际播放中
    pub active: bool,
}

pub struct PlaybackSequencer {
    transport: Arc<dyn MediaTransportPort>,
    cursor: Cursor,
    bound: Option<StreamHandle>,
    status: Option<TransportStatus>,
    now_playing: Option<NowPlaying>,
}

impl PlaybackSequencer {
    pub fn new(transport: Arc<dyn MediaTransportPort>) -> Self {
        Self {
            transport,
            cursor: Cursor::NONE,
            bound: None,
            status: None,
            now_playing: None,
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn now_playing(&self) -> Option<&NowPlaying> {
        self.now_playing.as_ref()
    }

    pub fn bound_stream_id(&self) -> Option<Uuid> {
        self.bound.as_ref().map(|h| h.id())
    }

    /// 当前状态；`track_count` 为活动播放列表长度（无活动列表时为 0）
    pub fn state(&self, track_count: usize) -> PlaybackState {
        match self.status {
            Some(status) if self.bound.is_some() => PlaybackState::from_transport(status),
            _ if track_count == 0 || self.cursor.is_none() => PlaybackState::Idle,
            _ => PlaybackState::Ready,
        }
    }

    pub fn snapshot(&self, track_count: usize) -> PlaybackSnapshot {
        let state = self.state(track_count);
        PlaybackSnapshot {
            state,
            cursor: self.cursor.index(),
            now_playing: self.now_playing.clone(),
            stream_id: self.bound.as_ref().map(|h| h.id()),
            stream_url: self.bound.as_ref().map(|h| h.url().to_string()),
            mime: self.bound.as_ref().map(|h| h.mime().to_string()),
            active: state.is_active(),
        }
    }

    /// 播放指定位置（钳制到有效范围）
    ///
    /// 曲目不存在时返回 `RecordNotFound`，游标和已绑定资源保持不变。
    /// 平台拒绝启动时保持绑定并处于暂停状态，不返回错误
    pub async fn play_index(
        &mut self,
        track_ids: &[TrackId],
        store: &dyn LibraryStorePort,
        index: usize,
    ) -> Result<PlayOutcome, ApplicationError> {
        let Some(target) = clamp_index(index, track_ids.len()) else {
            return Ok(PlayOutcome::Unchanged);
        };
        let track_id = &track_ids[target];

        let Some(track) = store.get_track(track_id).await? else {
            tracing::warn!(track_id = %track_id, index = target, "Track missing, playback skipped");
            return Err(ApplicationError::not_found("Track", track_id));
        };

        self.release_bound();

        let handle = match self.transport.bind(MediaSource {
            track_id: track.id.clone(),
            mime: track.mime.clone(),
            payload: track.payload,
        }) {
            Ok(handle) => handle,
            Err(e) => {
                self.cursor = Cursor::at(target);
                self.now_playing = None;
                tracing::warn!(track_id = %track.id, error = %e, "Failed to bind track");
                return Err(e.into());
            }
        };

        self.cursor = Cursor::at(target);
        self.now_playing = Some(NowPlaying {
            track_id: track.id.clone(),
            title: track.title.clone(),
            index: target,
        });

        let outcome = match self.transport.start(&handle).await {
            Ok(()) => {
                self.status = Some(TransportStatus::Playing);
                PlayOutcome::Started
            }
            Err(TransportError::StartRejected(reason)) => {
                tracing::debug!(stream_id = %handle.id(), reason = %reason, "Playback start rejected");
                self.status = Some(TransportStatus::Paused);
                PlayOutcome::StartRejected
            }
            Err(e) => {
                tracing::debug!(stream_id = %handle.id(), error = %e, "Playback start failed");
                self.status = Some(TransportStatus::Paused);
                PlayOutcome::StartRejected
            }
        };

        tracing::info!(
            track_id = %track.id,
            index = target,
            stream_id = %handle.id(),
            outcome = ?outcome,
            "Track bound"
        );

        self.bound = Some(handle);
        Ok(outcome)
    }

    /// 从当前位置播放，游标为 none 时从第一首开始。空列表为 no-op
    pub async fn play_current_or_first(
        &mut self,
        track_ids: &[TrackId],
        store: &dyn LibraryStorePort,
    ) -> Result<PlayOutcome, ApplicationError> {
        if track_ids.is_empty() {
            return Ok(PlayOutcome::Unchanged);
        }
        self.play_index(track_ids, store, self.cursor.current_or_first())
            .await
    }

    /// 下一首。越过末尾是严格的 no-op
    pub async fn next(
        &mut self,
        track_ids: &[TrackId],
        store: &dyn LibraryStorePort,
    ) -> Result<PlayOutcome, ApplicationError> {
        match self.cursor.next_target(track_ids.len()) {
            Some(target) => self.play_index(track_ids, store, target).await,
            None => Ok(PlayOutcome::Unchanged),
        }
    }

    /// 上一首。在开头钳制到 0 并重新播放
    pub async fn prev(
        &mut self,
        track_ids: &[TrackId],
        store: &dyn LibraryStorePort,
    ) -> Result<PlayOutcome, ApplicationError> {
        if track_ids.is_empty() {
            return Ok(PlayOutcome::Unchanged);
        }
        self.play_index(track_ids, store, self.cursor.prev_target())
            .await
    }

    /// 曲目自然结束
    ///
    /// 带有与当前绑定资源不符的 stream id 的通知已过期，直接忽略。
    /// 有下一首时自动前进；否则保持绑定、状态为 Ended，游标停在最后一首
    pub async fn on_ended(
        &mut self,
        track_ids: &[TrackId],
        store: &dyn LibraryStorePort,
        stream_id: Option<Uuid>,
    ) -> Result<PlayOutcome, ApplicationError> {
        let Some(bound_id) = self.bound_stream_id() else {
            return Ok(PlayOutcome::Unchanged);
        };
        if let Some(reported) = stream_id {
            if reported != bound_id {
                tracing::debug!(reported = %reported, bound = %bound_id, "Stale end-of-track report ignored");
                return Ok(PlayOutcome::Unchanged);
            }
        }

        self.status = Some(TransportStatus::Ended);

        match self.cursor.auto_advance_target(track_ids.len()) {
            Some(target) => self.play_index(track_ids, store, target).await,
            None => {
                tracing::info!(cursor = %self.cursor, "Reached end of playlist");
                Ok(PlayOutcome::Finished)
            }
        }
    }

    /// 暂停正在播放的资源，其他状态下为 no-op
    pub fn pause(&mut self) -> bool {
        match (&self.bound, self.status) {
            (Some(handle), Some(TransportStatus::Playing)) => {
                self.transport.pause(handle);
                self.status = Some(TransportStatus::Paused);
                tracing::debug!(stream_id = %handle.id(), "Playback paused");
                true
            }
            _ => false,
        }
    }

    /// 无条件释放资源、拆除传输并清空 "正在播放" 投影（游标保留）
    pub fn stop(&mut self) {
        self.release_bound();
        self.transport.halt();
        self.now_playing = None;
        tracing::debug!(cursor = %self.cursor, "Playback stopped");
    }

    /// 停止播放并把游标重置为 none（切换或新建播放列表时）
    pub fn reset(&mut self) {
        self.stop();
        self.cursor = Cursor::NONE;
    }

    /// 曲目从 `from` 移到 `to` 后修正游标，使其仍指向同一首曲目
    pub fn adjust_for_move(&mut self, from: usize, to: usize) {
        let adjusted = self.cursor.adjusted_for_move(from, to);
        if adjusted != self.cursor {
            tracing::debug!(from = %self.cursor, to = %adjusted, "Cursor adjusted after move");
            self.cursor = adjusted;
            if let Some(now_playing) = self.now_playing.as_mut() {
                if let Some(index) = adjusted.index() {
                    now_playing.index = index;
                }
            }
        }
    }

    /// 列表被其他会话重排后，把游标重新定位到正在播放的曲目
    pub fn relocate(&mut self, track_ids: &[TrackId]) {
        let Some(now_playing) = self.now_playing.as_mut() else {
            return;
        };
        if let Some(index) = track_ids.iter().position(|id| id == &now_playing.track_id) {
            now_playing.index = index;
            self.cursor = Cursor::at(index);
        }
    }

    /// 更新 "正在播放" 的标题（当前曲目被重命名时）
    pub fn refresh_title(&mut self, track_id: &TrackId, title: &str) -> bool {
        match self.now_playing.as_mut() {
            Some(now_playing) if &now_playing.track_id == track_id => {
                now_playing.title = title.to_string();
                true
            }
            _ => false,
        }
    }

    fn release_bound(&mut self) {
        if let Some(handle) = self.bound.take() {
            tracing::debug!(stream_id = %handle.id(), "Releasing bound stream");
            self.transport.release(handle);
        }
        self.status = None;
    }
}

impl Drop for PlaybackSequencer {
    fn drop(&mut self) {
        if let Some(handle) = self.bound.take() {
            self.transport.release(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::TrackRecord;
    use crate::infrastructure::adapters::FakeTransport;
    use crate::infrastructure::memory::InMemoryLibraryStore;

    struct Fixture {
        store: Arc<InMemoryLibraryStore>,
        transport: Arc<FakeTransport>,
        track_ids: Vec<TrackId>,
        sequencer: PlaybackSequencer,
    }

    async fn fixture(count: usize) -> Fixture {
        let store = InMemoryLibraryStore::new().arc();
        let mut track_ids = Vec::new();
        for i in 0..count {
            let track = TrackRecord::new(
                TrackId::generate(),
                format!("track {}", i),
                vec![i as u8 + 1; 8],
                "audio/mpeg",
            );
            store.put_track(&track).await.unwrap();
            track_ids.push(track.id);
        }
        let transport = FakeTransport::new().arc();
        let sequencer = PlaybackSequencer::new(transport.clone());
        Fixture {
            store,
            transport,
            track_ids,
            sequencer,
        }
    }

    #[tokio::test]
    async fn test_play_index_clamps_and_binds() {
        let mut f = fixture(3).await;

        let outcome = f
            .sequencer
            .play_index(&f.track_ids, f.store.as_ref(), 10)
            .await
            .unwrap();

        assert_eq!(outcome, PlayOutcome::Started);
        assert_eq!(f.sequencer.cursor(), Cursor::at(2));
        assert_eq!(f.sequencer.state(3), PlaybackState::Playing);
        assert_eq!(f.sequencer.now_playing().unwrap().title, "track 2");
        assert_eq!(f.transport.live_handles(), 1);
    }

    #[tokio::test]
    async fn test_switching_tracks_releases_previous() {
        let mut f = fixture(3).await;
        f.sequencer.play_index(&f.track_ids, f.store.as_ref(), 0).await.unwrap();
        let first = f.sequencer.bound_stream_id().unwrap();

        f.sequencer.play_index(&f.track_ids, f.store.as_ref(), 1).await.unwrap();

        assert!(!f.transport.is_live(&first));
        assert_eq!(f.transport.live_handles(), 1);
        assert_eq!(f.transport.bind_count(), 2);
        assert_eq!(f.transport.release_count(), 1);
        assert_eq!(f.transport.unknown_release_count(), 0);
    }

    #[tokio::test]
    async fn test_next_at_last_index_is_noop() {
        let mut f = fixture(3).await;
        f.sequencer.play_index(&f.track_ids, f.store.as_ref(), 2).await.unwrap();
        let bound = f.sequencer.bound_stream_id();

        let outcome = f.sequencer.next(&f.track_ids, f.store.as_ref()).await.unwrap();

        assert_eq!(outcome, PlayOutcome::Unchanged);
        assert_eq!(f.sequencer.cursor(), Cursor::at(2));
        assert_eq!(f.sequencer.bound_stream_id(), bound);
        assert_eq!(f.transport.bind_count(), 1);
    }

    #[tokio::test]
    async fn test_next_from_none_starts_at_first() {
        let mut f = fixture(3).await;
        f.sequencer.next(&f.track_ids, f.store.as_ref()).await.unwrap();
        assert_eq!(f.sequencer.cursor(), Cursor::at(0));
    }

    #[tokio::test]
    async fn test_prev_at_first_index_clamps() {
        let mut f = fixture(3).await;
        f.sequencer.play_index(&f.track_ids, f.store.as_ref(), 0).await.unwrap();

        let outcome = f.sequencer.prev(&f.track_ids, f.store.as_ref()).await.unwrap();

        assert_eq!(outcome, PlayOutcome::Started);
        assert_eq!(f.sequencer.cursor(), Cursor::at(0));
        // 钳制不是 no-op：同一首被重新绑定
        assert_eq!(f.transport.bind_count(), 2);
        assert_eq!(f.transport.live_handles(), 1);
    }

    #[tokio::test]
    async fn test_missing_track_leaves_state_unchanged() {
        let mut f = fixture(3).await;
        f.sequencer.play_index(&f.track_ids, f.store.as_ref(), 0).await.unwrap();
        let bound = f.sequencer.bound_stream_id();
        f.store.remove_track_externally(&f.track_ids[1]);

        let err = f
            .sequencer
            .play_index(&f.track_ids, f.store.as_ref(), 1)
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::RecordNotFound { .. }));
        assert_eq!(f.sequencer.cursor(), Cursor::at(0));
        assert_eq!(f.sequencer.bound_stream_id(), bound);
        assert_eq!(f.sequencer.state(3), PlaybackState::Playing);
        assert_eq!(f.transport.live_handles(), 1);
    }

    #[tokio::test]
    async fn test_start_rejection_stays_bound_and_paused() {
        let mut f = fixture(2).await;
        f.transport.reject_starts(true);

        let outcome = f
            .sequencer
            .play_current_or_first(&f.track_ids, f.store.as_ref())
            .await
            .unwrap();

        assert_eq!(outcome, PlayOutcome::StartRejected);
        assert_eq!(f.sequencer.state(2), PlaybackState::Paused);
        assert!(f.sequencer.bound_stream_id().is_some());
        assert!(!f.sequencer.snapshot(2).active);

        // 用户再次触发播放后恢复
        f.transport.reject_starts(false);
        f.sequencer
            .play_current_or_first(&f.track_ids, f.store.as_ref())
            .await
            .unwrap();
        assert_eq!(f.sequencer.state(2), PlaybackState::Playing);
        assert_eq!(f.transport.live_handles(), 1);
    }

    #[tokio::test]
    async fn test_bind_failure_releases_previous() {
        let mut f = fixture(2).await;
        f.sequencer.play_index(&f.track_ids, f.store.as_ref(), 0).await.unwrap();
        f.transport.fail_binds(true);

        let err = f
            .sequencer
            .play_index(&f.track_ids, f.store.as_ref(), 1)
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::TransportFailed(_)));
        assert_eq!(f.transport.live_handles(), 0);
        assert_eq!(f.sequencer.state(2), PlaybackState::Ready);
        assert_eq!(f.sequencer.cursor(), Cursor::at(1));
    }

    #[tokio::test]
    async fn test_on_ended_advances_then_finishes() {
        let mut f = fixture(2).await;
        f.sequencer.play_index(&f.track_ids, f.store.as_ref(), 0).await.unwrap();

        let outcome = f
            .sequencer
            .on_ended(&f.track_ids, f.store.as_ref(), None)
            .await
            .unwrap();
        assert_eq!(outcome, PlayOutcome::Started);
        assert_eq!(f.sequencer.cursor(), Cursor::at(1));

        let outcome = f
            .sequencer
            .on_ended(&f.track_ids, f.store.as_ref(), None)
            .await
            .unwrap();
        assert_eq!(outcome, PlayOutcome::Finished);
        assert_eq!(f.sequencer.cursor(), Cursor::at(1));
        assert_eq!(f.sequencer.state(2), PlaybackState::Ended);
        assert!(f.sequencer.bound_stream_id().is_some());
    }

    #[tokio::test]
    async fn test_stale_end_report_ignored() {
        let mut f = fixture(3).await;
        f.sequencer.play_index(&f.track_ids, f.store.as_ref(), 0).await.unwrap();

        let outcome = f
            .sequencer
            .on_ended(&f.track_ids, f.store.as_ref(), Some(Uuid::new_v4()))
            .await
            .unwrap();

        assert_eq!(outcome, PlayOutcome::Unchanged);
        assert_eq!(f.sequencer.cursor(), Cursor::at(0));
        assert_eq!(f.sequencer.state(3), PlaybackState::Playing);
    }

    #[tokio::test]
    async fn test_pause_and_stop() {
        let mut f = fixture(2).await;
        assert!(!f.sequencer.pause());

        f.sequencer.play_index(&f.track_ids, f.store.as_ref(), 1).await.unwrap();
        assert!(f.sequencer.pause());
        assert!(!f.sequencer.pause());
        assert_eq!(f.sequencer.state(2), PlaybackState::Paused);
        assert_eq!(f.transport.pause_count(), 1);

        f.sequencer.stop();
        assert_eq!(f.transport.live_handles(), 0);
        assert_eq!(f.transport.halt_count(), 1);
        assert!(f.sequencer.now_playing().is_none());
        assert_eq!(f.sequencer.cursor(), Cursor::at(1));
        assert_eq!(f.sequencer.state(2), PlaybackState::Ready);

        f.sequencer.reset();
        assert_eq!(f.sequencer.state(2), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn test_adjust_for_move_follows_playing_track() {
        let mut f = fixture(3).await;
        f.sequencer.play_index(&f.track_ids, f.store.as_ref(), 0).await.unwrap();

        f.sequencer.adjust_for_move(0, 1);
        assert_eq!(f.sequencer.cursor(), Cursor::at(1));
        assert_eq!(f.sequencer.now_playing().unwrap().index, 1);
        assert_eq!(f.sequencer.now_playing().unwrap().title, "track 0");
    }

    #[tokio::test]
    async fn test_drop_releases_bound_handle() {
        let mut f = fixture(1).await;
        f.sequencer.play_index(&f.track_ids, f.store.as_ref(), 0).await.unwrap();
        assert_eq!(f.transport.live_handles(), 1);

        drop(f.sequencer);
        assert_eq!(f.transport.live_handles(), 0);
        assert_eq!(f.transport.unknown_release_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_playlist_is_idle() {
        let mut f = fixture(0).await;
        let outcome = f
            .sequencer
            .play_current_or_first(&f.track_ids, f.store.as_ref())
            .await
            .unwrap();
        assert_eq!(outcome, PlayOutcome::Unchanged);
        assert_eq!(f.sequencer.state(0), PlaybackState::Idle);
        assert_eq!(
            f.sequencer.prev(&f.track_ids, f.store.as_ref()).await.unwrap(),
            PlayOutcome::Unchanged
        );
    }
}
