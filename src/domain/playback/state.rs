//! Playback Context - 播放状态

use serde::{Deserialize, Serialize};

/// 传输层状态（仅在已绑定资源时有意义）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportStatus {
    Playing,
    /// 已暂停，包括平台拒绝启动的情况
    Paused,
    /// 当前曲目已自然结束
    Ended,
}

/// 播放序列器状态
///
/// `Playing` / `Paused` 是 Bound 状态的两个传输细节
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// 没有活动播放列表或列表为空
    Idle,
    /// 游标有效，没有绑定资源
    Ready,
    Playing,
    Paused,
    /// 列表最后一首已结束，没有可自动前进的位置
    Ended,
}

impl PlaybackState {
    pub fn from_transport(status: TransportStatus) -> Self {
        match status {
            TransportStatus::Playing => PlaybackState::Playing,
            TransportStatus::Paused => PlaybackState::Paused,
            TransportStatus::Ended => PlaybackState::Ended,
        }
    }

    /// 是否处于实际播放中（屏幕常亮协调器观察此值）
    pub fn is_active(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_playing_is_active() {
        assert!(PlaybackState::Playing.is_active());
        assert!(!PlaybackState::Paused.is_active());
        assert!(!PlaybackState::Ready.is_active());
        assert!(!PlaybackState::Ended.is_active());
    }

    #[test]
    fn test_from_transport() {
        assert_eq!(
            PlaybackState::from_transport(TransportStatus::Paused),
            PlaybackState::Paused
        );
        assert_eq!(
            PlaybackState::from_transport(TransportStatus::Ended),
            PlaybackState::Ended
        );
    }
}
