//! WebSocket Handler
//!
//! 把 `PlayerEvent` 推送给客户端。客户端同时是媒体渲染端：
//! 它按 Transport* 事件加载 / 播放流，并通过 `/api/playback/ended` 报告曲目结束

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::infrastructure::events::PlayerEvent;
use crate::infrastructure::http::state::AppState;

pub async fn events_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_events_socket(socket, state))
}

fn encode(event: &PlayerEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Message::Text(json)),
        Err(e) => {
            tracing::error!(event = event.name(), error = %e, "Failed to serialize event");
            None
        }
    }
}

async fn handle_events_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // 先订阅再读取快照，避免错过两者之间的事件
    let mut event_rx = state.event_publisher.subscribe();
    let snapshot = state.session.lock().await.playback();

    tracing::info!(
        subscribers = state.event_publisher.subscriber_count(),
        "Event WebSocket connected"
    );

    let initial = PlayerEvent::PlaybackChanged {
        state: snapshot.state,
        cursor: snapshot.cursor,
    };
    if let Some(msg) = encode(&initial) {
        if sender.send(msg).await.is_err() {
            return;
        }
    }

    // 事件转发任务
    let mut forward_task = tokio::spawn(async move {
        loop {
            let event = match event_rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped = skipped, "Event WebSocket lagged behind");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let Some(msg) = encode(&event) else {
                continue;
            };

            if let Err(e) = sender.send(msg).await {
                tracing::debug!(error = %e, "Failed to send WebSocket message");
                break;
            }
        }
    });

    // 接收客户端消息（心跳 / 关闭）
    let mut receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => {
                    tracing::info!("Event WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Event WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    // 任一任务结束后终止另一个，订阅随转发任务一起释放
    tokio::select! {
        _ = &mut forward_task => receive_task.abort(),
        _ = &mut receive_task => forward_task.abort(),
    }

    tracing::info!("Event WebSocket disconnected");
}
