//! Common infrastructure shared by the ecsign crates
//!
//! Currently this is the structured logging layer: `env_logger` setup driven
//! by `RUST_LOG` and helpers that log signing events without leaking key
//! identifiers or signature material.

pub mod logging;

pub use logging::LoggingTransformer;
