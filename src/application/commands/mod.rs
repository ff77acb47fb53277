//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：由 LibrarySession 处理

mod library_commands;
mod playback_commands;

pub use library_commands::*;
pub use playback_commands::*;
