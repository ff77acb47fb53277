//! Playback Context - 播放游标

use serde::{Deserialize, Serialize};

/// 播放游标：当前在活动播放列表中的位置，或 "none"
///
/// 不变量:
/// - next 在末尾是严格的 no-op（不回绕、不停止）
/// - prev 在开头钳制到 0（不是 no-op）
/// - 自动前进只在下一位置有效时发生
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(Option<usize>);

impl Cursor {
    pub const NONE: Cursor = Cursor(None);

    pub fn at(index: usize) -> Self {
        Self(Some(index))
    }

    pub fn index(&self) -> Option<usize> {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    /// playCurrentOrFirst 的目标：none 视为 0
    pub fn current_or_first(&self) -> usize {
        self.0.unwrap_or(0)
    }

    /// next 的目标。越过最后一个有效位置时返回 `None`（no-op）
    pub fn next_target(&self, len: usize) -> Option<usize> {
        let target = match self.0 {
            None => 0,
            Some(index) => index + 1,
        };
        (target < len).then_some(target)
    }

    /// prev 的目标。none 或 0 时钳制到 0
    pub fn prev_target(&self) -> usize {
        match self.0 {
            None | Some(0) => 0,
            Some(index) => index - 1,
        }
    }

    /// 曲目自然结束后的自动前进目标
    pub fn auto_advance_target(&self, len: usize) -> Option<usize> {
        let index = self.0?;
        (index + 1 < len).then_some(index + 1)
    }

    /// 曲目从 `from` 移到 `to` 后，保持游标指向同一首曲目
    ///
    /// 相邻移动（|delta| = 1）时等价于交换规则:
    /// 游标 == from -> to；游标 == to -> from；否则不变
    pub fn adjusted_for_move(self, from: usize, to: usize) -> Self {
        let Some(cursor) = self.0 else {
            return self;
        };

        let adjusted = if cursor == from {
            to
        } else if from < to && cursor > from && cursor <= to {
            cursor - 1
        } else if to < from && cursor >= to && cursor < from {
            cursor + 1
        } else {
            cursor
        };
        Self(Some(adjusted))
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(index) => write!(f, "{}", index),
            None => f.write_str("none"),
        }
    }
}

/// 将任意请求位置钳制到 `[0, len - 1]`，空列表返回 `None`
pub fn clamp_index(index: usize, len: usize) -> Option<usize> {
    if len == 0 {
        None
    } else {
        Some(index.min(len - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::library::{move_item, move_target};

    #[test]
    fn test_next_is_strict_at_upper_bound() {
        assert_eq!(Cursor::at(2).next_target(3), None);
        assert_eq!(Cursor::at(1).next_target(3), Some(2));
        assert_eq!(Cursor::NONE.next_target(3), Some(0));
        assert_eq!(Cursor::NONE.next_target(0), None);
    }

    #[test]
    fn test_prev_clamps_at_lower_bound() {
        assert_eq!(Cursor::at(0).prev_target(), 0);
        assert_eq!(Cursor::NONE.prev_target(), 0);
        assert_eq!(Cursor::at(2).prev_target(), 1);
    }

    #[test]
    fn test_auto_advance() {
        assert_eq!(Cursor::at(0).auto_advance_target(3), Some(1));
        assert_eq!(Cursor::at(2).auto_advance_target(3), None);
        assert_eq!(Cursor::NONE.auto_advance_target(3), None);
    }

    #[test]
    fn test_adjacent_move_swaps() {
        // 移动正在播放的曲目
        assert_eq!(Cursor::at(1).adjusted_for_move(1, 2), Cursor::at(2));
        // 与正在播放的曲目交换
        assert_eq!(Cursor::at(2).adjusted_for_move(1, 2), Cursor::at(1));
        // 无关位置
        assert_eq!(Cursor::at(0).adjusted_for_move(1, 2), Cursor::at(0));
        assert_eq!(Cursor::NONE.adjusted_for_move(0, 1), Cursor::NONE);
    }

    #[test]
    fn test_cursor_keeps_track_identity_for_any_move() {
        for len in 1..=5usize {
            for index in 0..len {
                for delta in -5i64..=5 {
                    for current in 0..len {
                        let mut list: Vec<usize> = (0..len).collect();
                        let playing = list[current];
                        let mut cursor = Cursor::at(current);

                        if let Some(target) = move_target(len, index, delta).unwrap() {
                            move_item(&mut list, index, target);
                            cursor = cursor.adjusted_for_move(index, target);
                        }

                        assert_eq!(list[cursor.index().unwrap()], playing);
                    }
                }
            }
        }
    }

    #[test]
    fn test_clamp_index() {
        assert_eq!(clamp_index(7, 3), Some(2));
        assert_eq!(clamp_index(1, 3), Some(1));
        assert_eq!(clamp_index(0, 0), None);
    }
}
