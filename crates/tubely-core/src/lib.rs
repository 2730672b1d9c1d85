//! Tubely Core Library
//!
//! Domain models, error types, configuration and shared constants used by
//! every Tubely crate.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, Config, IngestConfig, RepositoryBackend};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{Orientation, ProbeResult, Video};
pub use storage_types::StorageBackend;
