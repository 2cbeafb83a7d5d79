//! HTTP client for the skip-trace provider.

mod client;
mod types;

pub use client::TraceClient;
pub use types::TraceQuery;
