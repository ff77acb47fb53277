//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 播放配置
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 公开访问的 Base URL（用于生成流地址）
    /// 如果未设置，则使用 http://{host}:{port}
    #[serde(default)]
    pub base_url: Option<String>,

    /// 静态文件服务配置
    #[serde(default)]
    pub static_files: StaticFilesConfig,
}

/// 静态文件服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct StaticFilesConfig {
    /// 是否启用静态文件服务
    #[serde(default = "default_static_enabled")]
    pub enabled: bool,

    /// 静态文件目录
    #[serde(default = "default_static_dir")]
    pub dir: PathBuf,

    /// URL 路径前缀（如 "/" 表示根路径托管）
    #[serde(default = "default_static_path")]
    pub path: String,
}

fn default_static_enabled() -> bool {
    false
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("web")
}

fn default_static_path() -> String {
    "/".to_string()
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: default_static_enabled(),
            dir: default_static_dir(),
            path: default_static_path(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: None,
            static_files: StaticFilesConfig::default(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 获取公开的 Base URL
    pub fn public_base_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| {
            let host = if self.host == "0.0.0.0" {
                "localhost"
            } else {
                &self.host
            };
            format!("http://{}:{}", host, self.port)
        })
    }
}

/// 存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Sled 嵌入式键值库
    #[default]
    Sled,
    /// SQLite 单文件数据库
    Sqlite,
    /// 仅内存，进程退出即丢失
    Memory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Sled => "sled",
            StorageBackend::Sqlite => "sqlite",
            StorageBackend::Memory => "memory",
        }
    }

    /// 是否持久化到磁盘
    pub fn is_durable(&self) -> bool {
        !matches!(self, StorageBackend::Memory)
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 存储后端
    #[serde(default)]
    pub backend: StorageBackend,

    /// 数据路径（sled 为目录，sqlite 为数据库文件）
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,

    /// SQLite 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// 上传文件最大大小（字节），默认 200MB
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("data/library")
}

fn default_max_connections() -> u32 {
    5
}

fn default_max_upload_size() -> u64 {
    200 * 1024 * 1024 // 200 MB
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
            max_connections: default_max_connections(),
            max_upload_size: default_max_upload_size(),
        }
    }
}

impl StorageConfig {
    /// SQLite 连接 URL
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path.display())
    }
}

/// 播放配置
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    /// 是否允许在没有用户手势的情况下自动开始播放
    /// 关闭时每次启动播放都会被拒绝，播放器停留在暂停状态
    #[serde(default = "default_autoplay")]
    pub autoplay: bool,
}

fn default_autoplay() -> bool {
    true
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            autoplay: default_autoplay(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5070);
        assert_eq!(config.storage.backend, StorageBackend::Sled);
        assert_eq!(config.storage.path, PathBuf::from("data/library"));
        assert!(config.playback.autoplay);
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "127.0.0.1:5070");
        assert_eq!(config.public_base_url(), "http://127.0.0.1:5070");
    }

    #[test]
    fn test_public_base_url_for_wildcard_host() {
        let config = ServerConfig {
            host: "0.0.0.0".to_string(),
            ..ServerConfig::default()
        };
        assert_eq!(config.public_base_url(), "http://localhost:5070");
    }

    #[test]
    fn test_database_url() {
        let config = StorageConfig {
            path: PathBuf::from("data/lyre.db"),
            ..StorageConfig::default()
        };
        assert_eq!(config.database_url(), "sqlite:data/lyre.db?mode=rwc");
    }

    #[test]
    fn test_backend_durability() {
        assert!(StorageBackend::Sled.is_durable());
        assert!(StorageBackend::Sqlite.is_durable());
        assert!(!StorageBackend::Memory.is_durable());
    }
}
