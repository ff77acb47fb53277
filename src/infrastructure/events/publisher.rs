//! Event Publisher Implementation
//!
//! WebSocket 事件推送实现。所有订阅者共享一个广播通道

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::domain::library::{PlaylistId, TrackId};
use crate::domain::playback::PlaybackState;

const CHANNEL_CAPACITY: usize = 100;

/// WebSocket 事件类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum PlayerEvent {
    /// "正在播放" 投影变更；停止时各字段为空
    NowPlaying {
        #[serde(skip_serializing_if = "Option::is_none")]
        track_id: Option<TrackId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },
    /// 播放器状态变更
    PlaybackChanged {
        state: PlaybackState,
        #[serde(skip_serializing_if = "Option::is_none")]
        cursor: Option<usize>,
    },
    /// 是否处于实际播放中（屏幕常亮协调器订阅此事件）
    PlaybackActive { active: bool },
    /// 加载已绑定的流
    TransportLoad {
        stream_id: Uuid,
        url: String,
        mime: String,
    },
    /// 开始播放已加载的流
    TransportPlay { stream_id: Uuid },
    /// 暂停
    TransportPause { stream_id: Uuid },
    /// 卸载并停止
    TransportHalt,
    /// 播放列表或曲目已修改
    LibraryChanged {
        #[serde(skip_serializing_if = "Option::is_none")]
        playlist_id: Option<PlaylistId>,
    },
}

impl PlayerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PlayerEvent::NowPlaying { .. } => "NowPlaying",
            PlayerEvent::PlaybackChanged { .. } => "PlaybackChanged",
            PlayerEvent::PlaybackActive { .. } => "PlaybackActive",
            PlayerEvent::TransportLoad { .. } => "TransportLoad",
            PlayerEvent::TransportPlay { .. } => "TransportPlay",
            PlayerEvent::TransportPause { .. } => "TransportPause",
            PlayerEvent::TransportHalt => "TransportHalt",
            PlayerEvent::LibraryChanged { .. } => "LibraryChanged",
        }
    }
}

/// 事件发布器
pub struct EventPublisher {
    channel: broadcast::Sender<PlayerEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { channel: tx }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅事件流
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.channel.subscribe()
    }

    /// 当前订阅者数量
    pub fn subscriber_count(&self) -> usize {
        self.channel.receiver_count()
    }

    /// 发布事件，没有订阅者时丢弃
    pub fn publish(&self, event: PlayerEvent) {
        let name = event.name();
        if let Err(e) = self.channel.send(event) {
            tracing::debug!(
                event = name,
                error = %e,
                "Failed to publish event (no receivers)"
            );
        }
    }

    pub fn publish_library_changed(&self, playlist_id: Option<&PlaylistId>) {
        self.publish(PlayerEvent::LibraryChanged {
            playlist_id: playlist_id.cloned(),
        });
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
