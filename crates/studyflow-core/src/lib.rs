//! Core types: providers, scopes, normalized fetch results

pub mod normalized;
pub mod provider;
pub mod tracing;

pub use normalized::{NormalizedAnnouncement, NormalizedMessage};
pub use provider::{Provider, UnknownProvider};
pub use tracing::{init_tracing, TracingConfig, TracingError, TracingOutputFormat};
