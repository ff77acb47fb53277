//! Lyre - 离线播放列表库与播放序列器
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Library Context: 播放列表 / 曲目标识、命名规则、重排
//! - Playback Context: 播放游标与状态
//!
//! 应用层 (application/):
//! - Ports: LibraryStorePort（带版本号的持久化存储）、MediaTransportPort（媒体传输）
//! - LibraryManager: 播放列表缓存与写操作
//! - PlaybackSequencer: 独占传输层的播放序列器
//! - LibrarySession: 两者的组合，应用根持有的唯一会话
//!
//! 基础设施层 (infrastructure/):
//! - Persistence: Sled / SQLite 存储，按 schema 版本迁移
//! - Memory: 内存存储（测试与临时运行）
//! - Adapters: 流注册传输层
//! - Events: WebSocket 事件发布
//! - HTTP: RESTful API + WebSocket

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
