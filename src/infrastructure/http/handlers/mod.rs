//! HTTP Handlers

mod ping;
mod playback;
mod playlists;
mod storage;
mod streams;
mod tracks;
mod websocket;

pub use ping::*;
pub use playback::*;
pub use playlists::*;
pub use storage::*;
pub use streams::*;
pub use tracks::*;
pub use websocket::*;
