//! HTTP Server
//!
//! Axum HTTP 服务器启动和配置

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::Router;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::middleware::error_logging_middleware;
use super::routes::create_routes;
use super::state::AppState;
use crate::config::AppConfig;

/// 静态文件托管
#[derive(Debug, Clone)]
pub struct StaticFiles {
    pub dir: PathBuf,
    /// URL 路径前缀，"/" 表示根路径托管
    pub path: String,
}

/// 服务器配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 请求体大小上限（导入上传）
    pub max_body_size: usize,
    pub static_files: Option<StaticFiles>,
}

impl ServerConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        let static_files = &config.server.static_files;
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            max_body_size: usize::try_from(config.storage.max_upload_size).unwrap_or(usize::MAX),
            static_files: static_files.enabled.then(|| StaticFiles {
                dir: static_files.dir.clone(),
                path: static_files.path.clone(),
            }),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// HTTP 服务器
pub struct HttpServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    /// 创建新的 HTTP 服务器
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// 构建 Router
    fn build_router(&self) -> Router {
        // CORS 配置 - 允许所有来源的跨域请求
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .expose_headers(Any)
            .max_age(std::time::Duration::from_secs(3600));

        let mut routes = create_routes();

        if let Some(static_files) = &self.config.static_files {
            info!(
                dir = %static_files.dir.display(),
                path = %static_files.path,
                "Serving static files"
            );
            let serve_dir = ServeDir::new(&static_files.dir);
            routes = if static_files.path == "/" {
                routes.fallback_service(serve_dir)
            } else {
                routes.nest_service(&static_files.path, serve_dir)
            };
        }

        routes
            .layer(DefaultBodyLimit::max(self.config.max_body_size))
            .layer(middleware::from_fn(error_logging_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(self.state.clone())
    }

    /// 启动服务器（带优雅关闭）
    pub async fn run_with_shutdown<F>(self, shutdown_signal: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();
        let addr = self.config.addr();

        info!("Starting HTTP server on {} (with graceful shutdown)", addr);

        let listener = TcpListener::bind(&addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    use crate::application::LibrarySession;
    use crate::infrastructure::adapters::StreamRegistryTransport;
    use crate::infrastructure::events::EventPublisher;
    use crate::infrastructure::memory::InMemoryLibraryStore;

    async fn server(config: ServerConfig) -> HttpServer {
        let publisher = EventPublisher::new().arc();
        let streams = StreamRegistryTransport::new(publisher.clone(), "http://x", true).arc();
        let session = LibrarySession::open(
            InMemoryLibraryStore::new().arc(),
            streams.clone(),
            publisher.clone(),
        )
        .await
        .unwrap();
        HttpServer::new(config, AppState::new(session, streams, publisher))
    }

    #[test]
    fn test_server_config_from_app_config() {
        let mut app = AppConfig::default();
        app.server.static_files.enabled = true;
        app.server.static_files.path = "/ui".to_string();

        let config = ServerConfig::from_app_config(&app);
        assert_eq!(config.addr(), "127.0.0.1:5070");
        assert_eq!(config.max_body_size as u64, app.storage.max_upload_size);
        assert_eq!(config.static_files.unwrap().path, "/ui");
    }

    #[tokio::test]
    async fn test_oversized_upload_rejected() {
        let mut config = ServerConfig::from_app_config(&AppConfig::default());
        config.max_body_size = 16;
        let router = server(config).await.build_router();

        let request = Request::builder()
            .method("POST")
            .uri("/api/playlists/create")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(format!("{{\"name\":\"{}\"}}", "x".repeat(64))))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_static_files_served_under_prefix() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>lyre</html>").unwrap();

        let mut config = ServerConfig::from_app_config(&AppConfig::default());
        config.static_files = Some(StaticFiles {
            dir: dir.path().to_path_buf(),
            path: "/ui".to_string(),
        });
        let router = server(config).await.build_router();

        let request = Request::builder()
            .uri("/ui/index.html")
            .body(Body::empty())
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let request = Request::builder().uri("/api/ping").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
