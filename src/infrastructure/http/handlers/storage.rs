//! Storage usage handler（配额展示）

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{GetStorageUsage, StoreUsage};
use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

pub async fn get_storage_usage(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<StoreUsage>>, ApiError> {
    let usage = state
        .get_storage_usage_handler
        .handle(GetStorageUsage)
        .await?;
    Ok(Json(ApiResponse::success(usage)))
}
