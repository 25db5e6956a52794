//! Infrastructure adapters and runtime bootstrap.

pub mod cache_sweeper;
pub mod error;
pub mod http;
pub mod telemetry;
pub mod upstream;
