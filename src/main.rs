//! Lyre - 离线播放列表库
//!
//! 启动顺序：配置 → 日志 → 存储（失败即退出）→ 会话 → HTTP 服务器

use std::path::PathBuf;

use lyre::application::LibrarySession;
use lyre::config::{load_config_from_path, print_config};
use lyre::infrastructure::adapters::StreamRegistryTransport;
use lyre::infrastructure::events::EventPublisher;
use lyre::infrastructure::http::{AppState, HttpServer, ServerConfig};
use lyre::infrastructure::persistence::open_library_store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值），可选参数为配置文件路径
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = load_config_from_path(config_path.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},lyre={},tower_http=debug",
        config.log.level, config.log.level
    );
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));
    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    tracing::info!("Lyre - offline playlist library");
    print_config(&config);

    // 打开存储并迁移 schema，失败对整个应用是致命的
    let store = open_library_store(&config.storage)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open library store: {}", e))?;

    // 事件发布器与传输层
    let event_publisher = EventPublisher::new().arc();
    let streams = StreamRegistryTransport::new(
        event_publisher.clone(),
        config.server.public_base_url(),
        config.playback.autoplay,
    )
    .arc();

    // 加载播放列表库
    let session = LibrarySession::open(store, streams.clone(), event_publisher.clone()).await?;
    tracing::info!(
        playlists = session.library().playlists().len(),
        "Library loaded"
    );

    let state = AppState::new(session, streams, event_publisher);
    let server = HttpServer::new(ServerConfig::from_app_config(&config), state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
