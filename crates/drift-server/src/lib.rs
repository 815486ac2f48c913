//! drift backend library: configuration, telemetry, the link storage domain
//! with field-level encryption, and the HTTP surface over it.

pub mod config;
pub mod link;
pub mod server;
pub mod telemetry;
