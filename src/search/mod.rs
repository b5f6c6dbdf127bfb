//! Query evaluation over the record store.
//!
//! - [`FuzzyIndex`]: approximate matching over the searchable fields, behind
//!   the pluggable [`FuzzyMatcher`] engine contract
//! - [`FilterEngine`]: structured AND-combined constraints, order preserving
//! - [`QueryCoordinator`]: exact-identifier shortcut, browse, fuzzy and
//!   filtered modes, plus pagination of a caller-owned [`Session`]
//! - [`DetailFormatter`]: ordered, classified projection of one record
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use vipdb_search::catalog::RecordStore;
//! use vipdb_search::models::QueryRequest;
//! use vipdb_search::search::{QueryCoordinator, SearchOptions};
//!
//! let store = RecordStore::from_json_str(
//!     r#"[{"PubMed_ID": "100", "Title": "SIFT"}, {"PubMed_ID": "200", "Title": "CADD"}]"#,
//! )
//! .unwrap();
//! let coordinator = QueryCoordinator::new(Arc::new(store), SearchOptions::default());
//!
//! let mut session = coordinator.session();
//! let response = coordinator.run_query(&mut session, &QueryRequest::new("200"));
//! assert_eq!(response.total_matches, 1);
//! ```

mod coordinator;
mod detail;
mod filter;
mod fuzzy;
mod page;

pub use coordinator::{QueryCoordinator, SearchOptions, Session, DEFAULT_MAX_FUZZY_RESULTS};
pub use detail::{DetailEntry, DetailFormatter, DisplayValue};
pub use filter::FilterEngine;
pub use fuzzy::{EditDistanceMatcher, FuzzyIndex, FuzzyMatcher, DEFAULT_THRESHOLD};
pub use page::{PageState, DEFAULT_PAGE_SIZE};
