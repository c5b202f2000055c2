//! Reelvault API Library
//!
//! HTTP surface for content-addressed video ingestion: multipart upload
//! handlers, error rendering, route and server setup.

mod api_doc;
pub mod constants;
mod handlers;
pub mod setup;
mod telemetry;

pub mod error;
pub mod state;

pub use api_doc::ApiDoc;
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
