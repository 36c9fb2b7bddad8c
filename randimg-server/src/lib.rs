//! Randimg Server Library - REST API for collecting random images
//!
//! This library exposes the server components for use in integration tests.
//! The main binary uses these same components.

pub mod cache;
pub mod config;
pub mod creator;
pub mod error;
pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod store;
pub mod validation;

pub use cache::ResponseCache;
pub use config::Config;
pub use creator::ImageCreator;
pub use error::ApiError;
pub use openapi::ApiDoc;
pub use routes::{create_router, create_router_with_config};
pub use state::AppState;
pub use store::{
    open_store, ImageRecord, ImageStore, ListQuery, MemoryImageStore, NewImage,
    PostgresImageStore, SortOrder, StoreError,
};
