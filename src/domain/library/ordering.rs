//! Library Context - 有序曲目列表的重排规则
//!
//! 只处理纯逻辑，持久化由应用层负责

use super::LibraryError;

/// 计算移动目标位置
///
/// `target = clamp(index + delta, 0, len - 1)`。
/// 返回 `Ok(None)` 表示无需移动（首项上移、末项下移等越界情况被吸收）
pub fn move_target(len: usize, index: usize, delta: i64) -> Result<Option<usize>, LibraryError> {
    if index >= len {
        return Err(LibraryError::InvalidPosition { index, len });
    }

    let last = (len - 1) as i64;
    let target = (index as i64).saturating_add(delta).clamp(0, last) as usize;

    if target == index {
        Ok(None)
    } else {
        Ok(Some(target))
    }
}

/// 将 `index` 处的元素移除后插入到 `target`，长度与元素多重集合保持不变
pub fn move_item<T>(items: &mut Vec<T>, index: usize, target: usize) {
    let item = items.remove(index);
    items.insert(target, item);
}
