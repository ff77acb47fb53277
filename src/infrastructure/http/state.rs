//! Application State
//!
//! 所有请求共享唯一的 `LibrarySession`，通过互斥锁串行执行

use std::sync::Arc;

use crate::application::{
    GetPlaylistTracksHandler, GetStorageUsageHandler, LibraryStorePort, LibrarySession,
    SharedSession,
};
use crate::infrastructure::adapters::StreamRegistryTransport;
use crate::infrastructure::events::EventPublisher;

/// 应用状态
pub struct AppState {
    // ========== Session ==========
    pub session: SharedSession,

    // ========== Ports ==========
    pub store: Arc<dyn LibraryStorePort>,
    pub streams: Arc<StreamRegistryTransport>,
    pub event_publisher: Arc<EventPublisher>,

    // ========== Query Handlers ==========
    pub get_playlist_tracks_handler: GetPlaylistTracksHandler,
    pub get_storage_usage_handler: GetStorageUsageHandler,
}

impl AppState {
    /// `streams` 必须是 session 中序列器使用的同一个传输层
    pub fn new(
        session: LibrarySession,
        streams: Arc<StreamRegistryTransport>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        let store = session.store();

        Self {
            session: SharedSession::new(session),
            store: store.clone(),
            streams,
            event_publisher,
            get_playlist_tracks_handler: GetPlaylistTracksHandler::new(store.clone()),
            get_storage_usage_handler: GetStorageUsageHandler::new(store),
        }
    }
}
