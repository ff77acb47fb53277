//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（LibraryStore、MediaTransport）
//! - library_manager / sequencer / session: 播放列表库、播放序列器及其组合
//! - commands: CQRS 命令
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod library_manager;
pub mod ports;
pub mod queries;
pub mod sequencer;
pub mod session;

pub use commands::{
    CreatePlaylist, ImportItem, ImportTracks, ImportTracksResponse, MoveTrack, MoveTrackResponse,
    PlayIndex, PlayOutcome, RenameTrack, SelectPlaylist, TrackEnded,
};

pub use error::ApplicationError;

pub use library_manager::LibraryManager;

pub use ports::{
    LibraryStorePort, MediaSource, MediaTransportPort, PlaylistRecord, StoreError, StoreKind,
    StoreUsage, StreamHandle, TrackMeta, TrackRecord, TransportError, CURRENT_SCHEMA_VERSION,
};

pub use queries::{
    handlers::{
        GetPlaylistTracksHandler, GetStorageUsageHandler, PlaylistSummary, PlaylistTracksResponse,
        TrackRow,
    },
    GetPlaylistTracks, GetStorageUsage,
};

pub use sequencer::{NowPlaying, PlaybackSequencer, PlaybackSnapshot};
pub use session::{LibrarySession, SharedSession};
