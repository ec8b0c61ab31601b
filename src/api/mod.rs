//! API Module
//!
//! HTTP handlers and routing for inspecting a running cache.
//!
//! # Endpoints
//! - `PUT /set` - Store a value
//! - `GET /get/:key` - Retrieve a value by key
//! - `DELETE /del/:key` - Delete a key
//! - `DELETE /invalidate` - Delete keys matching a pattern
//! - `DELETE /clear` - Empty a backend
//! - `POST /cleanup` - Run a sweep now
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
