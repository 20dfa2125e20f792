//! HTTP surface of veneer
//!
//! Routes, per-resource rewrite chains, and the error mapping that keeps
//! response bodies bit-compatible with the backend the portal was written
//! against.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod state;

#[cfg(test)]
mod testutil;

pub use error::ApiError;
pub use router::api_router;
pub use state::AppState;
