//! Core data models for catalog records and queries.

pub mod fields;
mod query;
mod record;

pub use query::{
    CategoricalConstraint, ConstraintSet, QueryError, QueryMode, QueryRequest, QueryResponse,
    RankedMatch, TextConstraint, TextField, YearRange,
};
pub use record::{normalize_identifier, stringify, Record};
