//! # VIPDB Search
//!
//! Query engine over the VIP (variant interpretation tool) catalog: a
//! static JSON array of publication records searched by exact PubMed ID,
//! fuzzy free text, or structured filters, with paginated results and an
//! ordered detail view.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Record, QueryRequest, QueryResponse, etc.)
//! - [`catalog`]: Dataset loading and the immutable record store
//! - [`search`]: Fuzzy index, filter engine, query coordinator and detail formatter
//! - [`mcp`]: MCP protocol implementation and server
//! - [`config`]: Configuration management
//! - [`ui`]: Terminal rendering helpers for the `vipdb` binary

pub mod catalog;
pub mod config;
pub mod mcp;
pub mod models;
pub mod search;
pub mod ui;

// Re-export commonly used types
pub use catalog::{LoadError, RecordStore};
pub use models::{QueryRequest, QueryResponse, Record};
pub use search::{QueryCoordinator, SearchOptions, Session};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
