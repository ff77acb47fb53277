//! Library Context - Value Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LibraryError;

/// 未命名曲目的默认标题
pub const UNTITLED: &str = "Untitled";

/// 导入时未提供 MIME 类型的默认值
pub const DEFAULT_MIME: &str = "audio/mpeg";

/// 播放列表唯一标识
///
/// 新生成的 ID 形如 `pl_<uuid>`；从存储或请求中解析时接受任意字符串
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(String);

impl PlaylistId {
    pub fn generate() -> Self {
        Self(format!("pl_{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PlaylistId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for PlaylistId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 曲目唯一标识（`tr_<uuid>`）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn generate() -> Self {
        Self(format!("tr_{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TrackId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TrackId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 播放列表名称
///
/// 不变量: 去除首尾空白后非空。空名称直接拒绝，不做默认值替换
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistName(String);

impl PlaylistName {
    pub fn new(name: impl AsRef<str>) -> Result<Self, LibraryError> {
        let name = name.as_ref().trim();
        if name.is_empty() {
            return Err(LibraryError::InvalidName(
                "播放列表名称不能为空".to_string(),
            ));
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for PlaylistName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 曲目标题
///
/// 与播放列表名称不同，空标题不会被拒绝，而是替换为 [`UNTITLED`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackTitle(String);

impl TrackTitle {
    /// 用户输入的标题：去除首尾空白，空则为 "Untitled"
    pub fn from_input(input: &str) -> Self {
        let title = input.trim();
        if title.is_empty() {
            Self(UNTITLED.to_string())
        } else {
            Self(title.to_string())
        }
    }

    /// 由文件名推导默认标题：去掉最后一个扩展名
    ///
    /// 扩展名必须非空，且不含 `/` 或 `.`（`a.b.mp3` -> `a.b`，`a.` 保持不变）
    pub fn from_file_name(file_name: &str) -> Self {
        let stem = strip_last_extension(file_name);
        if stem.trim().is_empty() {
            Self(UNTITLED.to_string())
        } else {
            Self(stem.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for TrackTitle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn strip_last_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(dot) => {
            let ext = &file_name[dot + 1..];
            if ext.is_empty() || ext.contains('/') {
                file_name
            } else {
                &file_name[..dot]
            }
        }
        None => file_name,
    }
}

/// 导入 MIME 类型：空字符串回退到 [`DEFAULT_MIME`]
pub fn normalize_mime(mime: &str) -> String {
    let mime = mime.trim();
    if mime.is_empty() {
        DEFAULT_MIME.to_string()
    } else {
        mime.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_prefixed_and_unique() {
        let a = PlaylistId::generate();
        let b = PlaylistId::generate();
        assert!(a.as_str().starts_with("pl_"));
        assert_ne!(a, b);
        assert!(TrackId::generate().as_str().starts_with("tr_"));
    }

    #[test]
    fn test_playlist_name_is_trimmed() {
        let name = PlaylistName::new("  Road trip \n").unwrap();
        assert_eq!(name.as_str(), "Road trip");
    }

    #[test]
    fn test_empty_playlist_name_rejected() {
        assert!(PlaylistName::new("").is_err());
        assert!(PlaylistName::new("   \t").is_err());
    }

    #[test]
    fn test_title_from_input() {
        assert_eq!(TrackTitle::from_input("  Intro  ").as_str(), "Intro");
        assert_eq!(TrackTitle::from_input("   ").as_str(), UNTITLED);
        assert_eq!(TrackTitle::from_input("").as_str(), UNTITLED);
    }

    #[test]
    fn test_title_from_file_name() {
        assert_eq!(TrackTitle::from_file_name("a.mp3").as_str(), "a");
        assert_eq!(TrackTitle::from_file_name("live.at.home.mp3").as_str(), "live.at.home");
        assert_eq!(TrackTitle::from_file_name("noext").as_str(), "noext");
        assert_eq!(TrackTitle::from_file_name("trailing.").as_str(), "trailing.");
        assert_eq!(TrackTitle::from_file_name("dir.d/song").as_str(), "dir.d/song");
        assert_eq!(TrackTitle::from_file_name(".mp3").as_str(), UNTITLED);
        assert_eq!(TrackTitle::from_file_name("").as_str(), UNTITLED);
    }

    #[test]
    fn test_normalize_mime() {
        assert_eq!(normalize_mime(""), DEFAULT_MIME);
        assert_eq!(normalize_mime("audio/ogg"), "audio/ogg");
    }
}
