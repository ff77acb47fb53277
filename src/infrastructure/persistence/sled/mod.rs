//! Sled 嵌入式存储

mod library_store;

pub use library_store::SledLibraryStore;
