//! Video record persistence.
//!
//! `VideoRepository` is the only way the ingestion pipeline touches video
//! records. Postgres backs production; the in-memory implementation backs
//! tests and local runs without a database.

pub mod memory;
pub mod ownership;
pub mod postgres;
pub mod repository;

pub use memory::InMemoryVideoRepository;
pub use ownership::{authorize_video_owner, AuthorizedVideo};
pub use postgres::PgVideoRepository;
pub use repository::VideoRepository;
