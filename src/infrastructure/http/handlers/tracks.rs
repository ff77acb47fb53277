//! Track HTTP Handlers

use axum::{
    extract::{Multipart, State},
    Json,
};
use std::path::Path;
use std::sync::Arc;

use crate::application::{ImportItem, ImportTracks, MoveTrack, RenameTrack, TrackMeta};
use crate::domain::library::normalize_mime;
use crate::infrastructure::http::dto::{
    ApiResponse, ImportResponse, MoveResponse, MoveTrackRequest, RenameTrackRequest,
    TrackResponse,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 按扩展名识别的音频格式
const AUDIO_EXTENSIONS: [(&str, &str); 7] = [
    ("mp3", "audio/mpeg"),
    ("m4a", "audio/mp4"),
    ("aac", "audio/aac"),
    ("wav", "audio/wav"),
    ("flac", "audio/flac"),
    ("ogg", "audio/ogg"),
    ("opus", "audio/opus"),
];

/// 文件类型过滤：声明为 audio/* 或扩展名可识别的文件才会导入
///
/// 返回导入时使用的 MIME 类型
fn accept_audio(file_name: &str, content_type: Option<&str>) -> Option<String> {
    if let Some(ct) = content_type.filter(|ct| ct.starts_with("audio/")) {
        return Some(normalize_mime(ct));
    }

    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())?;

    AUDIO_EXTENSIONS
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| mime.to_string())
}

/// 导入音频文件到活动播放列表
///
/// 每个 `file` 字段对应一首曲目，按上传顺序追加
pub async fn import_tracks(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ImportResponse>>, ApiError> {
    let mut items = Vec::new();
    let mut skipped = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let Some(mime) = accept_audio(&file_name, field.content_type()) else {
            tracing::debug!(file_name = %file_name, "Skipping non-audio upload");
            skipped.push(file_name);
            continue;
        };

        let payload = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?;

        items.push(ImportItem {
            file_name,
            payload: payload.to_vec(),
            mime,
        });
    }

    let result = state
        .session
        .run(|mut session| async move { session.import_tracks(ImportTracks { items }).await })
        .await?;

    Ok(Json(ApiResponse::success(ImportResponse {
        playlist_id: result.playlist_id,
        track_ids: result.track_ids,
        skipped,
    })))
}

/// 重命名曲目；空白标题存为 "Untitled"
pub async fn rename_track(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RenameTrackRequest>,
) -> Result<Json<ApiResponse<TrackResponse>>, ApiError> {
    let command = RenameTrack {
        track_id: req.id,
        title: req.title,
    };
    let track = state
        .session
        .run(|mut session| async move { session.rename_track(command).await })
        .await?;

    Ok(Json(ApiResponse::success(TrackMeta::from(&track).into())))
}

/// 在活动播放列表中移动曲目
pub async fn move_track(
    State(state): State<Arc<AppState>>,
    Json(req): Json<MoveTrackRequest>,
) -> Result<Json<ApiResponse<MoveResponse>>, ApiError> {
    let command = MoveTrack {
        index: req.index,
        delta: req.delta,
    };
    let moved = state
        .session
        .run(move |mut session| async move { session.move_track(command).await })
        .await?;

    Ok(Json(ApiResponse::success(moved.into())))
}
