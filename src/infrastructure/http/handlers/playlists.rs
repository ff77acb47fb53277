//! Playlist HTTP Handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{CreatePlaylist, GetPlaylistTracks, PlaylistSummary, SelectPlaylist};
use crate::infrastructure::http::dto::{
    ApiResponse, CreatePlaylistRequest, Empty, PlaylistListResponse, PlaylistResponse,
    PlaylistTracksDto, PlaylistTracksRequest, SelectPlaylistRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 列出所有播放列表（最近更新在前）
pub async fn list_playlists(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<PlaylistListResponse>>, ApiError> {
    let session = state.session.lock().await;
    let library = session.library();

    let playlists = library
        .playlists()
        .iter()
        .map(|p| PlaylistResponse::from(PlaylistSummary::from(p)))
        .collect();

    Ok(Json(ApiResponse::success(PlaylistListResponse {
        active_playlist_id: library.active_playlist_id().cloned(),
        playlists,
    })))
}

/// 创建播放列表并设为活动列表
pub async fn create_playlist(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePlaylistRequest>,
) -> Result<Json<ApiResponse<PlaylistResponse>>, ApiError> {
    let record = state
        .session
        .run(|mut session| async move {
            session.create_playlist(CreatePlaylist { name: req.name }).await
        })
        .await?;

    Ok(Json(ApiResponse::success(PlaylistSummary::from(&record).into())))
}

/// 切换活动播放列表
pub async fn select_playlist(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectPlaylistRequest>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    let mut session = state.session.lock().await;
    session.select_playlist(SelectPlaylist {
        playlist_id: req.id,
    })?;

    Ok(Json(ApiResponse::ok()))
}

/// 获取播放列表中已解析的曲目
pub async fn get_playlist_tracks(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlaylistTracksRequest>,
) -> Result<Json<ApiResponse<PlaylistTracksDto>>, ApiError> {
    let playlist_id = match req.id {
        Some(id) => id,
        None => state
            .session
            .lock()
            .await
            .library()
            .active_playlist_id()
            .cloned()
            .ok_or_else(|| ApiError::BadRequest("No active playlist".to_string()))?,
    };

    let result = state
        .get_playlist_tracks_handler
        .handle(GetPlaylistTracks { playlist_id })
        .await?;

    Ok(Json(ApiResponse::success(result.into())))
}
