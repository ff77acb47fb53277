//! Playback HTTP Handlers
//!
//! 会改变绑定资源的操作经 `SharedSession::run` 执行，pause / stop 为同步操作

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{PlayIndex, PlayOutcome, PlaybackSnapshot, TrackEnded};
use crate::infrastructure::http::dto::{
    ApiResponse, PauseResponse, PlayRequest, PlaybackResponse, TrackEndedRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

type PlaybackResult = Result<Json<ApiResponse<PlaybackResponse>>, ApiError>;

fn respond((outcome, playback): (PlayOutcome, PlaybackSnapshot)) -> PlaybackResult {
    Ok(Json(ApiResponse::success(PlaybackResponse { outcome, playback })))
}

/// 当前播放状态
pub async fn get_playback(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<PlaybackSnapshot>>, ApiError> {
    let session = state.session.lock().await;
    Ok(Json(ApiResponse::success(session.playback())))
}

/// 播放指定位置，或从当前位置 / 第一首开始
pub async fn play(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PlayRequest>,
) -> PlaybackResult {
    let index = req.index.map(|index| PlayIndex { index });
    let result = state
        .session
        .run(move |mut session| async move {
            let outcome = session.play(index).await;
            outcome.map(|o| (o, session.playback()))
        })
        .await?;
    respond(result)
}

pub async fn next(State(state): State<Arc<AppState>>) -> PlaybackResult {
    let result = state
        .session
        .run(|mut session| async move {
            let outcome = session.next().await;
            outcome.map(|o| (o, session.playback()))
        })
        .await?;
    respond(result)
}

pub async fn prev(State(state): State<Arc<AppState>>) -> PlaybackResult {
    let result = state
        .session
        .run(|mut session| async move {
            let outcome = session.prev().await;
            outcome.map(|o| (o, session.playback()))
        })
        .await?;
    respond(result)
}

pub async fn pause(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<PauseResponse>>, ApiError> {
    let mut session = state.session.lock().await;
    let paused = session.pause();
    Ok(Json(ApiResponse::success(PauseResponse {
        paused,
        playback: session.playback(),
    })))
}

/// 停止播放并释放资源，游标保留
pub async fn stop(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<PlaybackSnapshot>>, ApiError> {
    let mut session = state.session.lock().await;
    session.stop();
    Ok(Json(ApiResponse::success(session.playback())))
}

/// 客户端报告曲目自然结束
pub async fn track_ended(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TrackEndedRequest>,
) -> PlaybackResult {
    let command = TrackEnded {
        stream_id: req.stream_id,
    };
    let result = state
        .session
        .run(move |mut session| async move {
            let outcome = session.track_ended(command).await;
            outcome.map(|o| (o, session.playback()))
        })
        .await?;
    respond(result)
}
