//! Query request and response models.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::fields;
use super::Record;

/// Errors raised while building a constraint set from user input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// Categorical filter on a field that is not filterable
    #[error("Unknown filter field: {0} (expected one of: {list})", list = fields::FILTERABLE_FIELDS.join(", "))]
    UnknownField(String),

    /// Filter expression that is not of the form FIELD=VALUE
    #[error("Malformed filter: {0} (expected FIELD=VALUE)")]
    MalformedFilter(String),
}

/// Fields that accept case-insensitive substring constraints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    Title,
    VipName,
    VipFamilyName,
    Identifier,
}

impl TextField {
    /// Dataset field this constraint reads
    pub fn field_name(&self) -> &'static str {
        match self {
            TextField::Title => fields::TITLE,
            TextField::VipName => fields::VIP_NAME,
            TextField::VipFamilyName => fields::VIP_FAMILY_NAME,
            TextField::Identifier => fields::PUBMED_ID,
        }
    }
}

/// Substring constraint on one text field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextConstraint {
    pub field: TextField,

    /// Lowercased, trimmed needle
    pub needle: String,
}

/// Inclusive year range; a missing end is unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl YearRange {
    /// Create a range from already parsed bounds
    pub fn new(from: Option<i64>, to: Option<i64>) -> Self {
        Self { from, to }
    }

    /// Build a range from raw user input.
    ///
    /// Malformed bounds are treated as unbounded rather than as errors.
    pub fn parse(from: Option<&str>, to: Option<&str>) -> Self {
        Self {
            from: parse_bound(from),
            to: parse_bound(to),
        }
    }

    /// Whether at least one bound is set
    pub fn is_bounded(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    /// Whether the year falls inside the range
    pub fn contains(&self, year: i64) -> bool {
        self.from.map_or(true, |from| year >= from) && self.to.map_or(true, |to| year <= to)
    }
}

fn parse_bound(raw: Option<&str>) -> Option<i64> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<i64>() {
        Ok(year) => Some(year),
        Err(e) => {
            tracing::debug!("Ignoring malformed year bound {:?}: {}", raw, e);
            None
        }
    }
}

/// Exact-value constraint on a categorical field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalConstraint {
    /// Canonical field name from [`fields::FILTERABLE_FIELDS`]
    pub field: String,

    /// Required stringified value (never empty)
    pub value: String,
}

/// Structured constraints, combined with AND
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSet {
    /// Substring constraints on text fields
    #[serde(default)]
    pub text: Vec<TextConstraint>,

    /// Publication year range
    #[serde(default)]
    pub year: YearRange,

    /// Categorical equality constraints
    #[serde(default)]
    pub categorical: Vec<CategoricalConstraint>,
}

impl ConstraintSet {
    /// Create an empty constraint set
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any constraint is active
    pub fn is_active(&self) -> bool {
        !self.text.is_empty() || self.year.is_bounded() || !self.categorical.is_empty()
    }

    /// Add a substring constraint; blank needles are ignored
    pub fn contains(mut self, field: TextField, needle: impl AsRef<str>) -> Self {
        let needle = needle.as_ref().trim().to_lowercase();
        if !needle.is_empty() {
            self.text.retain(|c| c.field != field);
            self.text.push(TextConstraint { field, needle });
        }
        self
    }

    /// Title substring constraint
    pub fn title(self, needle: impl AsRef<str>) -> Self {
        self.contains(TextField::Title, needle)
    }

    /// VIP name substring constraint
    pub fn vip_name(self, needle: impl AsRef<str>) -> Self {
        self.contains(TextField::VipName, needle)
    }

    /// VIP family name substring constraint
    pub fn vip_family_name(self, needle: impl AsRef<str>) -> Self {
        self.contains(TextField::VipFamilyName, needle)
    }

    /// Identifier substring constraint
    pub fn identifier(self, needle: impl AsRef<str>) -> Self {
        self.contains(TextField::Identifier, needle)
    }

    /// Set the year range
    pub fn year(mut self, range: YearRange) -> Self {
        self.year = range;
        self
    }

    /// Add a categorical equality constraint.
    ///
    /// A blank value means "no constraint" and is omitted, so an unselected
    /// filter never matches records that lack the field.
    pub fn equals(
        mut self,
        field: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, QueryError> {
        let canonical = fields::filterable_field(field.as_ref())
            .ok_or_else(|| QueryError::UnknownField(field.as_ref().to_string()))?;
        let value = value.as_ref().trim();
        if value.is_empty() {
            return Ok(self);
        }
        self.categorical.retain(|c| c.field != canonical);
        self.categorical.push(CategoricalConstraint {
            field: canonical.to_string(),
            value: value.to_string(),
        });
        Ok(self)
    }

    /// Add a categorical constraint from a `FIELD=VALUE` expression
    pub fn equals_expr(self, expr: &str) -> Result<Self, QueryError> {
        let (field, value) = expr
            .split_once('=')
            .ok_or_else(|| QueryError::MalformedFilter(expr.to_string()))?;
        if field.trim().is_empty() {
            return Err(QueryError::MalformedFilter(expr.to_string()));
        }
        self.equals(field, value)
    }
}

/// One user interaction: free text and/or structured constraints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Free text typed into the search box
    #[serde(default)]
    pub text: String,

    /// Structured filters
    #[serde(default)]
    pub constraints: ConstraintSet,
}

impl QueryRequest {
    /// Create a free-text request
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            constraints: ConstraintSet::default(),
        }
    }

    /// Set the structured constraints
    pub fn constraints(mut self, constraints: ConstraintSet) -> Self {
        self.constraints = constraints;
        self
    }

    /// Trimmed free text
    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }
}

/// A record paired with its store position and optional relevance score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMatch {
    /// Position of the record in the store
    pub position: usize,

    /// Normalized distance from the fuzzy engine (lower is better)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    pub record: Arc<Record>,
}

impl RankedMatch {
    /// Create an unscored match
    pub fn unscored(position: usize, record: Arc<Record>) -> Self {
        Self {
            position,
            score: None,
            record,
        }
    }

    /// Create a scored match
    pub fn scored(position: usize, record: Arc<Record>, score: f64) -> Self {
        Self {
            position,
            score: Some(score),
            record,
        }
    }
}

/// How a result list was produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// No query and no constraints: the whole store in load order
    #[default]
    Browse,
    /// Free text equal to a record identifier
    ExactId,
    /// Free text ranked by the fuzzy index
    Fuzzy,
    /// Structured constraints, in load order
    Filtered,
}

/// Visible page of a query result
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    /// Records on the current page
    pub results: Vec<RankedMatch>,

    /// Size of the full result list
    pub total_matches: usize,

    /// Current page (1-based)
    pub page: usize,

    /// Page size
    pub page_size: usize,

    /// Number of pages (0 when there are no matches)
    pub total_pages: usize,

    /// How the result list was produced
    pub mode: QueryMode,

    /// Cap applied to fuzzy results
    #[serde(skip)]
    pub fuzzy_cap: usize,
}

impl QueryResponse {
    /// Whether a following page exists
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Whether a preceding page exists
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// One-line status describing the result
    pub fn summary(&self) -> String {
        match self.mode {
            QueryMode::ExactId => "Exact identifier match: 1 record".to_string(),
            QueryMode::Browse => format!("Loaded {} records.", self.total_matches),
            QueryMode::Fuzzy => format!(
                "Matches: {} (showing up to {})",
                self.total_matches, self.fuzzy_cap
            ),
            QueryMode::Filtered => format!("Matches: {}", self.total_matches),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_range_inclusion() {
        let year = 2020;
        assert!(YearRange::new(Some(2019), Some(2021)).contains(year));
        assert!(YearRange::new(Some(2020), Some(2020)).contains(year));
        assert!(YearRange::new(None, Some(2020)).contains(year));
        assert!(YearRange::new(Some(2020), None).contains(year));
        assert!(!YearRange::new(Some(2021), None).contains(year));
        assert!(!YearRange::new(None, Some(2019)).contains(year));
    }

    #[test]
    fn test_year_range_parse_malformed_is_unbounded() {
        let range = YearRange::parse(Some("20x0"), Some(" 2021 "));
        assert_eq!(range, YearRange::new(None, Some(2021)));

        let range = YearRange::parse(Some(""), None);
        assert!(!range.is_bounded());
    }

    #[test]
    fn test_blank_constraints_are_omitted() {
        let set = ConstraintSet::new()
            .title("   ")
            .equals("Database", "")
            .unwrap();
        assert!(!set.is_active());
    }

    #[test]
    fn test_text_constraint_is_lowercased() {
        let set = ConstraintSet::new().title("  Splice AI ");
        assert_eq!(set.text[0].needle, "splice ai");
        assert_eq!(set.text[0].field.field_name(), "Title");
    }

    #[test]
    fn test_equals_uses_canonical_field() {
        let set = ConstraintSet::new().equals("gene-specific", "1").unwrap();
        assert_eq!(set.categorical[0].field, "Gene-specific");
        assert!(set.is_active());
    }

    #[test]
    fn test_equals_rejects_unknown_field() {
        let err = ConstraintSet::new().equals("Title", "x").unwrap_err();
        assert_eq!(err, QueryError::UnknownField("Title".to_string()));
    }

    #[test]
    fn test_equals_expr() {
        let set = ConstraintSet::new().equals_expr("Database=1").unwrap();
        assert_eq!(set.categorical[0].value, "1");

        assert!(matches!(
            ConstraintSet::new().equals_expr("Database"),
            Err(QueryError::MalformedFilter(_))
        ));
        assert!(matches!(
            ConstraintSet::new().equals_expr("=1"),
            Err(QueryError::MalformedFilter(_))
        ));
    }

    #[test]
    fn test_repeated_field_replaces_constraint() {
        let set = ConstraintSet::new()
            .equals("Database", "1")
            .unwrap()
            .equals("Database", "0")
            .unwrap();
        assert_eq!(set.categorical.len(), 1);
        assert_eq!(set.categorical[0].value, "0");
    }
}
