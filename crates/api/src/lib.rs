//! HTTP API layer for plaza.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: auth, users, profiles, friendships, posts, groups
//! - **Extractors**: Authentication
//! - **Middleware**: Bearer-token auth, logging, CORS
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
