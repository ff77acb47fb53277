//! Stream Handler
//!
//! 返回当前已绑定资源的音频数据。资源释放后地址立即失效

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::infrastructure::http::state::AppState;

/// 媒体元素直接消费此地址，因此失效时返回真实的 404 状态码
pub async fn get_stream(
    State(state): State<Arc<AppState>>,
    Path(stream_id): Path<Uuid>,
) -> Response {
    match state.streams.stream(&stream_id) {
        Some(stream) => (
            [
                (header::CONTENT_TYPE, stream.mime),
                (header::CACHE_CONTROL, "no-store".to_string()),
            ],
            stream.payload,
        )
            .into_response(),
        None => {
            tracing::debug!(stream_id = %stream_id, "Stream not registered");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
