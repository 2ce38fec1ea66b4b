//! Infrastructure adapters and runtime bootstrap.

pub mod elastic;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod memory_index;
pub mod redis_store;
pub mod telemetry;
