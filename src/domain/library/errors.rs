//! Library Context - Errors

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LibraryError {
    #[error("无效的名称: {0}")]
    InvalidName(String),

    #[error("无效的位置: index {index}, 列表长度 {len}")]
    InvalidPosition { index: usize, len: usize },
}
