//! Stream Registry Transport
//!
//! 把已绑定的曲目内容注册为 `/streams/{id}` 下的可流式资源，
//! 并通过事件流向客户端下发加载 / 播放 / 暂停 / 停止指令

use async_trait::async_trait;
use axum::body::Bytes;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::ports::{MediaSource, MediaTransportPort, StreamHandle, TransportError};
use crate::domain::library::TrackId;
use crate::infrastructure::events::{EventPublisher, PlayerEvent};

/// 已注册的流
#[derive(Debug, Clone)]
pub struct BoundStream {
    pub track_id: TrackId,
    pub mime: String,
    pub payload: Bytes,
}

/// Stream Registry Transport
pub struct StreamRegistryTransport {
    streams: DashMap<Uuid, BoundStream>,
    publisher: Arc<EventPublisher>,
    base_url: String,
    autoplay: bool,
}

impl StreamRegistryTransport {
    pub fn new(publisher: Arc<EventPublisher>, base_url: impl Into<String>, autoplay: bool) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::info!(base_url = %base_url, autoplay = autoplay, "StreamRegistryTransport initialized");
        Self {
            streams: DashMap::new(),
            publisher,
            base_url,
            autoplay,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 查找已注册的流（已释放的流返回 None）
    pub fn stream(&self, id: &Uuid) -> Option<BoundStream> {
        self.streams.get(id).map(|s| s.clone())
    }

    /// 当前注册的流数量
    pub fn active_streams(&self) -> usize {
        self.streams.len()
    }
}

#[async_trait]
impl MediaTransportPort for StreamRegistryTransport {
    fn bind(&self, source: MediaSource) -> Result<StreamHandle, TransportError> {
        if source.payload.is_empty() {
            return Err(TransportError::BindFailed(format!(
                "track {} has no audio data",
                source.track_id
            )));
        }

        let id = Uuid::new_v4();
        let url = format!("{}/streams/{}", self.base_url, id);
        let size_bytes = source.payload.len();

        self.streams.insert(
            id,
            BoundStream {
                track_id: source.track_id.clone(),
                mime: source.mime.clone(),
                payload: Bytes::from(source.payload),
            },
        );

        tracing::debug!(
            stream_id = %id,
            track_id = %source.track_id,
            size_bytes = size_bytes,
            "Stream registered"
        );

        self.publisher.publish(PlayerEvent::TransportLoad {
            stream_id: id,
            url: url.clone(),
            mime: source.mime.clone(),
        });

        Ok(StreamHandle::new(id, source.track_id, source.mime, url))
    }

    fn release(&self, handle: StreamHandle) {
        if self.streams.remove(&handle.id()).is_none() {
            tracing::warn!(stream_id = %handle.id(), "Released stream was not registered");
            return;
        }
        tracing::debug!(
            stream_id = %handle.id(),
            track_id = %handle.track_id(),
            remaining = self.active_streams(),
            "Stream revoked"
        );
    }

    async fn start(&self, handle: &StreamHandle) -> Result<(), TransportError> {
        if !self.autoplay {
            return Err(TransportError::StartRejected("autoplay disabled".to_string()));
        }
        if self.publisher.subscriber_count() == 0 {
            return Err(TransportError::StartRejected("no client attached".to_string()));
        }
        if !self.streams.contains_key(&handle.id()) {
            return Err(TransportError::StartRejected(format!(
                "stream {} is not registered",
                handle.id()
            )));
        }

        self.publisher.publish(PlayerEvent::TransportPlay {
            stream_id: handle.id(),
        });
        Ok(())
    }

    fn pause(&self, handle: &StreamHandle) {
        self.publisher.publish(PlayerEvent::TransportPause {
            stream_id: handle.id(),
        });
    }

    fn halt(&self) {
        self.publisher.publish(PlayerEvent::TransportHalt);
    }
}
