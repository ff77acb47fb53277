//! Playback Context - 播放序列限界上下文
//!
//! 职责:
//! - 游标移动规则（next / prev / 自动前进）
//! - 重排后的游标修正
//! - 播放状态

mod cursor;
mod state;

pub use cursor::{clamp_index, Cursor};
pub use state::{PlaybackState, TransportStatus};
