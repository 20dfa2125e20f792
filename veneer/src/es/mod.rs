//! Elasticsearch transport and response shaping

pub mod client;
pub mod response;

pub use client::{EsClient, SearchBackend};
pub use response::normalise_response;
