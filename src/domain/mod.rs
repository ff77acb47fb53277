//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Library Context: 播放列表与曲目
//! - Playback Context: 播放游标与状态

pub mod library;
pub mod playback;
