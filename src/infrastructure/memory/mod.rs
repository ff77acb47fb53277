//! Memory Layer - 非持久化存储

mod library_store;

pub use library_store::InMemoryLibraryStore;
