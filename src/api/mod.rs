//! HTTP search API
//!
//! A thin axum layer over [`SearchEngine`](crate::engine::SearchEngine).
//! Parameter validation lives here; the core assumes valid parameters.

pub mod handlers;
pub mod router;
pub mod types;

pub use router::{create_router, AppState};
