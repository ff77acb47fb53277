//! Fake Transport - 用于测试的传输层
//!
//! 只记录绑定 / 释放 / 启动次数，不产生任何实际输出

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::ports::{MediaSource, MediaTransportPort, StreamHandle, TransportError};
use crate::domain::library::TrackId;

/// Fake Transport
#[derive(Default)]
pub struct FakeTransport {
    live: DashMap<Uuid, TrackId>,
    binds: AtomicUsize,
    releases: AtomicUsize,
    unknown_releases: AtomicUsize,
    starts: AtomicUsize,
    pauses: AtomicUsize,
    halts: AtomicUsize,
    reject_starts: AtomicBool,
    fail_binds: AtomicBool,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 之后的 start 全部被拒绝（模拟自动播放被阻止）
    pub fn reject_starts(&self, reject: bool) {
        self.reject_starts.store(reject, Ordering::SeqCst);
    }

    /// 之后的 bind 全部失败
    pub fn fail_binds(&self, fail: bool) {
        self.fail_binds.store(fail, Ordering::SeqCst);
    }

    /// 尚未释放的资源数量
    pub fn live_handles(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, id: &Uuid) -> bool {
        self.live.contains_key(id)
    }

    pub fn bind_count(&self) -> usize {
        self.binds.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    /// 释放了未绑定（或已释放）资源的次数
    pub fn unknown_release_count(&self) -> usize {
        self.unknown_releases.load(Ordering::SeqCst)
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn pause_count(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }

    pub fn halt_count(&self) -> usize {
        self.halts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaTransportPort for FakeTransport {
    fn bind(&self, source: MediaSource) -> Result<StreamHandle, TransportError> {
        if self.fail_binds.load(Ordering::SeqCst) {
            return Err(TransportError::BindFailed("fake bind failure".to_string()));
        }

        let id = Uuid::new_v4();
        self.live.insert(id, source.track_id.clone());
        self.binds.fetch_add(1, Ordering::SeqCst);

        Ok(StreamHandle::new(
            id,
            source.track_id,
            source.mime,
            format!("fake://{}", id),
        ))
    }

    fn release(&self, handle: StreamHandle) {
        if self.live.remove(&handle.id()).is_some() {
            self.releases.fetch_add(1, Ordering::SeqCst);
        } else {
            self.unknown_releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn start(&self, _handle: &StreamHandle) -> Result<(), TransportError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        if self.reject_starts.load(Ordering::SeqCst) {
            return Err(TransportError::StartRejected("fake autoplay block".to_string()));
        }
        Ok(())
    }

    fn pause(&self, _handle: &StreamHandle) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }

    fn halt(&self) {
        self.halts.fetch_add(1, Ordering::SeqCst);
    }
}
