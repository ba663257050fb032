// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod instrument;
pub mod metrics;
pub mod noise;
pub mod normalize;
pub mod paging;
pub mod render;
pub mod routes;

pub use crate::api::{create_router, AppState};
pub use crate::feed::{FeedEnvelope, FeedItem};
