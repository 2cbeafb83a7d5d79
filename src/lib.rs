//! # MNUDA Trace
//!
//! Normalizes skip-trace provider responses into typed entities and tracks
//! investigation sessions built from successive lookups.
//!
//! ## Features
//!
//! - **Tolerant parsing**: Field names are resolved through alias tables, so
//!   provider spelling drift never fails a parse
//! - **Typed entities**: Properties, addresses, phones, emails, persons and images
//!   with provenance and categories
//! - **Sessions**: Lookup nodes persisted through a pluggable key-value store
//! - **Lead summaries**: Actionable address and person counts per session
//!
//! ## Architecture
//!
//! ```text
//! Trace API (HTTP) → parser → entities
//!                       ↓
//!               SessionStore → KeyValueStore (SQLite / memory)
//! ```
//!
//! ## Example
//!
//! ```
//! use mnuda_trace::parse_person_detail_response;
//! use serde_json::json;
//!
//! let raw = json!({
//!     "Person Details": [{"Person_name": "Jane Doe", "Age": "42"}],
//!     "Email Addresses": ["jane@example.com"],
//!     "source": "ProviderX"
//! });
//!
//! let parsed = parse_person_detail_response(&raw);
//! assert_eq!(parsed.total_entities, 2);
//! assert_eq!(parsed.source, "ProviderX");
//! ```

#![warn(missing_docs)]

/// Command-line interface.
pub mod cli;
/// Configuration loaded from the environment.
pub mod config;
/// Entity model produced by the parsers.
pub mod entities;
/// Error types and result aliases for the application.
pub mod error;
/// Alias tables and tolerant field access over raw payloads.
pub mod extract;
/// Response parsers.
pub mod parser;
/// Investigation sessions and their persistence.
pub mod session;
/// Key-value persistence backends.
pub mod storage;
/// Skip-trace provider client.
pub mod trace_api;

pub use config::Config;
pub use entities::{Category, Entity, EntityCounts, EntityData, EntityKind};
pub use error::{AppError, AppResult};
pub use parser::{
    parse_person_detail_response, parse_person_response, parse_trace_response,
    ParsedPersonDetailData, ParsedTrace, PersonResponse,
};
pub use session::{NodeData, SessionData, SessionStore};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
