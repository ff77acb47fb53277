//! Query Handlers

mod library_handlers;

pub use library_handlers::*;
