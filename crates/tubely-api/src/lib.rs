//! Tubely API Library
//!
//! HTTP surface of the video ingestion service: handlers, bearer-token auth,
//! the ingestion and thumbnail pipelines, and application setup.

mod api_doc;
mod handlers;
mod utils;

// Public modules
pub mod auth;
pub mod error;
pub mod services;
pub mod setup;
pub mod state;

// Re-exports
pub use api_doc::ApiDoc;
pub use auth::{CredentialValidator, JwtService, UserContext};
pub use error::{ErrorResponse, HttpAppError};
pub use services::{IngestService, ThumbnailService};
pub use setup::services::{build_state, Collaborators};
pub use state::AppState;
