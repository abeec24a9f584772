//! Adapters - Implementations of ports for external systems.
//!
//! - `memory` - tokio `RwLock` implementations; the default wiring for
//!   tests and local development
//! - `postgres` - sqlx-backed persistent implementations
//! - `http` - axum routes, DTOs, and error mapping

pub mod http;
pub mod memory;
pub mod postgres;
