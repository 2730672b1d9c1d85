//! Tubely Storage Library
//!
//! Storage abstraction for published videos and thumbnails, with S3 and local
//! filesystem implementations.
//!
//! # Object key format
//!
//! Video keys are `{orientation}/{token}.{ext}` where `token` is 32 random
//! bytes encoded as URL-safe base64 without padding. Keys never carry user or
//! content identifying data. Key derivation lives in the `keys` module so
//! every backend sees the same layout.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::{random_token, ObjectKey};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
pub use tubely_core::StorageBackend;
