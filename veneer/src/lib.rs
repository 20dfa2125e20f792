//! Core library for veneer, a compatibility layer that keeps a legacy
//! genomics data portal working against a modern Elasticsearch cluster.
//!
//! The portal was written against index mappings and response shapes that
//! no longer exist. Rather than rewrite the portal, every request passes
//! through here on its way to the cluster and every response on its way
//! back. The pieces fit together like this:
//!
//! - [`rewrite`] adjusts incoming query trees so legacy field names and
//!   free-text payloads hit the right modern mappings.
//! - [`synonyms`] folds alias spellings of analysis-group values onto the
//!   canonical labels stored in the index, backed by a TTL cache over the
//!   reference index.
//! - [`search`] runs a single search round trip: body defaults, rewrite
//!   chain, dispatch, response normalisation.
//! - [`es`] is the transport: the [`es::SearchBackend`] seam plus the
//!   reqwest client that talks to the cluster.
//! - [`export`] projects hits into TSV rows for spreadsheet downloads.
//! - [`fixup`] holds small per-document repairs applied before documents
//!   reach the portal.

pub mod config;
pub mod error;
pub mod es;
pub mod export;
pub mod fixup;
pub mod rewrite;
pub mod search;
pub mod synonyms;

pub use config::Settings;
pub use error::{Error, Result};
