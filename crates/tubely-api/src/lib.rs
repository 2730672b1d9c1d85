//! Tubely API Library
//!
//! HTTP handlers, bearer-token auth, error rendering and application setup.

mod api_doc;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod telemetry;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
