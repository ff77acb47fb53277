//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                GET   健康检查
//! - /api/playlists           GET   播放列表（最近更新在前）+ 活动列表 ID
//! - /api/playlists/create    POST  创建播放列表
//! - /api/playlists/select    POST  切换活动播放列表
//! - /api/playlists/tracks    POST  播放列表中已解析的曲目
//! - /api/tracks/import       POST  multipart 导入到活动播放列表
//! - /api/tracks/rename       POST  重命名曲目
//! - /api/tracks/move         POST  移动曲目
//! - /api/playback            GET   播放状态快照
//! - /api/playback/play       POST  播放指定位置 / 当前位置
//! - /api/playback/pause      POST  暂停
//! - /api/playback/next       POST  下一首
//! - /api/playback/prev       POST  上一首
//! - /api/playback/stop       POST  停止
//! - /api/playback/ended      POST  客户端报告曲目结束
//! - /api/storage             GET   存储使用量
//! - /streams/{id}            GET   已绑定资源的音频数据
//! - /ws/events               WS    播放器事件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/streams/:stream_id", get(handlers::get_stream))
        .route("/ws/events", get(handlers::events_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/playlists", get(handlers::list_playlists))
        .route("/playlists/create", post(handlers::create_playlist))
        .route("/playlists/select", post(handlers::select_playlist))
        .route("/playlists/tracks", post(handlers::get_playlist_tracks))
        .nest("/tracks", track_routes())
        .route("/playback", get(handlers::get_playback))
        .route("/playback/play", post(handlers::play))
        .route("/playback/pause", post(handlers::pause))
        .route("/playback/next", post(handlers::next))
        .route("/playback/prev", post(handlers::prev))
        .route("/playback/stop", post(handlers::stop))
        .route("/playback/ended", post(handlers::track_ended))
        .route("/storage", get(handlers::get_storage_usage))
}

/// Track 路由
fn track_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/import", post(handlers::import_tracks))
        .route("/rename", post(handlers::rename_track))
        .route("/move", post(handlers::move_track))
}
