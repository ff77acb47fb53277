//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod library_store;
mod media_transport;

pub use library_store::{
    check_version, plan_migration, LibraryStorePort, PlaylistRecord, StoreError, StoreKind, StoreUsage,
    TrackMeta, TrackRecord, CURRENT_SCHEMA_VERSION,
};
pub use media_transport::{MediaSource, MediaTransportPort, StreamHandle, TransportError};
