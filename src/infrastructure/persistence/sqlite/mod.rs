//! SQLite Persistence - SQLite 数据库持久化实现

mod database;
mod library_store;

pub use database::*;
pub use library_store::*;
