//! 应用层 - 查询（读操作）
//!
//! CQRS 查询侧：直接读取存储，不经过会话锁

mod library_queries;

pub mod handlers;

pub use library_queries::*;
