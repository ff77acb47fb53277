//! Library Context - 播放列表与曲目限界上下文
//!
//! 职责:
//! - 播放列表 / 曲目标识
//! - 名称与标题规则
//! - 有序曲目列表的重排

mod errors;
mod ordering;
mod value_objects;

pub use errors::LibraryError;
pub use ordering::{move_item, move_target};
pub use value_objects::{
    normalize_mime, PlaylistId, PlaylistName, TrackId, TrackTitle, DEFAULT_MIME, UNTITLED,
};
