//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `POST /get` - Read a key through the cache
//! - `POST /insert` - Write a key through to the origin
//! - `POST /update` - Replace a key's value
//! - `DELETE /delete` - Delete a key
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
