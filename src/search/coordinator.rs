//! Query orchestration: exact-identifier shortcut, browse, fuzzy search and
//! structured filtering, plus pagination of the resulting list.
//!
//! The coordinator itself is immutable and can be shared between callers.
//! Everything that changes between interactions (the last request, its
//! result list and the page) lives in a caller-owned [`Session`].

use std::collections::HashSet;
use std::sync::Arc;

use super::detail::{DetailEntry, DetailFormatter};
use super::filter::FilterEngine;
use super::fuzzy::{EditDistanceMatcher, FuzzyIndex, FuzzyMatcher, DEFAULT_THRESHOLD};
use super::page::{PageState, DEFAULT_PAGE_SIZE};
use crate::catalog::RecordStore;
use crate::models::fields::SEARCHABLE_FIELDS;
use crate::models::{QueryMode, QueryRequest, QueryResponse, RankedMatch, Record};

/// Default cap on fuzzy results
pub const DEFAULT_MAX_FUZZY_RESULTS: usize = 50;

/// Tunables for query evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Fuzzy acceptance threshold (lower is stricter)
    pub threshold: f64,

    /// Maximum number of fuzzy matches kept
    pub max_fuzzy_results: usize,

    /// Results per page
    pub page_size: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            max_fuzzy_results: DEFAULT_MAX_FUZZY_RESULTS,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchOptions {
    /// Set the fuzzy threshold
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the fuzzy result cap
    pub fn max_fuzzy_results(mut self, max: usize) -> Self {
        self.max_fuzzy_results = max;
        self
    }

    /// Set the page size
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }
}

/// Per-caller query state
#[derive(Debug, Clone)]
pub struct Session {
    last_request: Option<QueryRequest>,
    results: Vec<RankedMatch>,
    mode: QueryMode,
    page: PageState,
}

impl Session {
    /// Fresh session with no query run yet
    pub fn new(page_size: usize) -> Self {
        Self {
            last_request: None,
            results: Vec::new(),
            mode: QueryMode::default(),
            page: PageState::new(page_size),
        }
    }

    /// Current page state
    pub fn page(&self) -> &PageState {
        &self.page
    }

    /// Full result list of the last query
    pub fn results(&self) -> &[RankedMatch] {
        &self.results
    }

    /// Mode of the last query
    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    /// The last request, if any
    pub fn last_request(&self) -> Option<&QueryRequest> {
        self.last_request.as_ref()
    }

    /// Results on the current page
    pub fn visible(&self) -> &[RankedMatch] {
        &self.results[self.page.slice(self.results.len())]
    }
}

/// Turns query requests into ordered, paginated result lists
#[derive(Debug)]
pub struct QueryCoordinator {
    store: Arc<RecordStore>,
    index: FuzzyIndex,
    options: SearchOptions,
}

impl QueryCoordinator {
    /// Build the fuzzy index with the default matcher and wrap the store
    pub fn new(store: Arc<RecordStore>, options: SearchOptions) -> Self {
        let matcher = EditDistanceMatcher::new(options.threshold);
        Self::with_matcher(store, options, Box::new(matcher))
    }

    /// Build with a custom fuzzy engine
    pub fn with_matcher(
        store: Arc<RecordStore>,
        options: SearchOptions,
        matcher: Box<dyn FuzzyMatcher>,
    ) -> Self {
        let index = FuzzyIndex::build(&store, SEARCHABLE_FIELDS, matcher);
        Self {
            store,
            index,
            options,
        }
    }

    /// The underlying store
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Active options
    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Fresh session sized for this coordinator
    pub fn session(&self) -> Session {
        Session::new(self.options.page_size)
    }

    /// Evaluate a request and return its current page.
    ///
    /// The page resets to 1 whenever the request differs from the previous
    /// one, and always for an exact identifier match.
    pub fn run_query(&self, session: &mut Session, request: &QueryRequest) -> QueryResponse {
        let (mode, results) = self.evaluate(request);

        if mode == QueryMode::ExactId || session.last_request.as_ref() != Some(request) {
            session.page.reset();
        }
        session.last_request = Some(request.clone());
        session.mode = mode;
        session.results = results;
        session.page.clamp(session.results.len());

        tracing::debug!(
            "Query {:?} ({:?}) matched {} records",
            request.trimmed_text(),
            mode,
            session.results.len()
        );
        self.respond(session)
    }

    /// Move to the next page without recomputing the match set
    pub fn next_page(&self, session: &mut Session) -> QueryResponse {
        let total = session.results.len();
        session.page.next(total);
        self.respond(session)
    }

    /// Move to the previous page without recomputing the match set
    pub fn previous_page(&self, session: &mut Session) -> QueryResponse {
        session.page.previous();
        self.respond(session)
    }

    /// Jump to a page (clamped) without recomputing the match set
    pub fn go_to_page(&self, session: &mut Session, page: usize) -> QueryResponse {
        let total = session.results.len();
        session.page.go_to(page, total);
        self.respond(session)
    }

    /// Detail projection of a record
    pub fn get_details(&self, record: &Record) -> Vec<DetailEntry> {
        DetailFormatter::project(record)
    }

    /// Exact identifier lookup
    pub fn find_by_identifier(&self, id: &str) -> Option<&Arc<Record>> {
        self.store.find_by_identifier(id).map(|(_, record)| record)
    }

    fn evaluate(&self, request: &QueryRequest) -> (QueryMode, Vec<RankedMatch>) {
        let text = request.trimmed_text();

        if let Some((position, record)) = self.store.find_by_identifier(text) {
            return (
                QueryMode::ExactId,
                vec![RankedMatch::unscored(position, Arc::clone(record))],
            );
        }

        let constraints = &request.constraints;
        if text.is_empty() && !constraints.is_active() {
            let all = self
                .store
                .all()
                .iter()
                .enumerate()
                .map(|(position, record)| RankedMatch::unscored(position, Arc::clone(record)))
                .collect();
            return (QueryMode::Browse, all);
        }

        if !constraints.is_active() {
            let mut ranked = self.index.search(text);
            ranked.truncate(self.options.max_fuzzy_results);
            return (QueryMode::Fuzzy, ranked);
        }

        let mut filtered = FilterEngine::evaluate(&self.store, constraints);
        if !text.is_empty() {
            let accepted: HashSet<usize> =
                self.index.search(text).iter().map(|m| m.position).collect();
            filtered.retain(|m| accepted.contains(&m.position));
        }
        (QueryMode::Filtered, filtered)
    }

    fn respond(&self, session: &Session) -> QueryResponse {
        let total = session.results.len();
        QueryResponse {
            results: session.visible().to_vec(),
            total_matches: total,
            page: session.page.page(),
            page_size: session.page.page_size(),
            total_pages: session.page.total_pages(total),
            mode: session.mode,
            fuzzy_cap: self.options.max_fuzzy_results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConstraintSet, YearRange};
    use serde_json::json;

    fn coordinator(value: serde_json::Value, page_size: usize) -> QueryCoordinator {
        let store = Arc::new(RecordStore::load(value).unwrap());
        QueryCoordinator::new(store, SearchOptions::default().page_size(page_size))
    }

    fn three() -> QueryCoordinator {
        coordinator(
            json!([
                {"PubMed_ID": "100", "Title": "SIFT predicts effects", "Database": "1", "Year": 2001},
                {"PubMed_ID": "200", "Title": "PolyPhen-2 server", "Database": "0", "Year": 2010},
                {"PubMed_ID": "300", "Title": "CADD scores", "Database": "1", "Year": 2014}
            ]),
            50,
        )
    }

    fn many(n: usize) -> QueryCoordinator {
        let records: Vec<serde_json::Value> = (0..n)
            .map(|i| json!({"PubMed_ID": format!("{}", 1000 + i), "Title": format!("Tool {}", i), "Database": "1"}))
            .collect();
        coordinator(serde_json::Value::Array(records), 50)
    }

    fn ids(response: &QueryResponse) -> Vec<String> {
        response.results.iter().map(|m| m.record.identifier()).collect()
    }

    #[test]
    fn test_exact_identifier_shortcut() {
        let c = three();
        let mut session = c.session();
        let response = c.run_query(&mut session, &QueryRequest::new(" 200 "));
        assert_eq!(response.mode, QueryMode::ExactId);
        assert_eq!(ids(&response), vec!["200"]);
        assert_eq!(response.total_matches, 1);
        assert_eq!(response.summary(), "Exact identifier match: 1 record");
    }

    #[test]
    fn test_exact_identifier_ignores_constraints() {
        let c = three();
        let mut session = c.session();
        let request = QueryRequest::new("200").constraints(
            ConstraintSet::new()
                .equals("Database", "1")
                .unwrap()
                .year(YearRange::new(Some(2020), None)),
        );
        let response = c.run_query(&mut session, &request);
        assert_eq!(ids(&response), vec!["200"]);
    }

    #[test]
    fn test_browse_returns_store_in_order() {
        let c = many(120);
        let mut session = c.session();
        let response = c.run_query(&mut session, &QueryRequest::default());
        assert_eq!(response.mode, QueryMode::Browse);
        assert_eq!(response.total_matches, 120);
        assert_eq!(response.results.len(), 50);
        assert_eq!(response.results[0].position, 0);
        assert_eq!(response.total_pages, 3);
        assert_eq!(response.summary(), "Loaded 120 records.");
    }

    #[test]
    fn test_fuzzy_without_match_is_empty() {
        let c = three();
        let mut session = c.session();
        let response = c.run_query(&mut session, &QueryRequest::new("cancer"));
        assert_eq!(response.mode, QueryMode::Fuzzy);
        assert_eq!(response.total_matches, 0);
        assert_eq!(response.total_pages, 0);
        assert_eq!(response.page, 1);
        assert!(response.results.is_empty());
    }

    #[test]
    fn test_fuzzy_results_are_capped() {
        let c = many(80);
        let mut session = c.session();
        let response = c.run_query(&mut session, &QueryRequest::new("tool"));
        assert_eq!(response.total_matches, DEFAULT_MAX_FUZZY_RESULTS);
        assert_eq!(response.summary(), "Matches: 50 (showing up to 50)");
    }

    #[test]
    fn test_categorical_filter_scenario() {
        let c = three();
        let mut session = c.session();
        let request =
            QueryRequest::default().constraints(ConstraintSet::new().equals("Database", "1").unwrap());
        let response = c.run_query(&mut session, &request);
        assert_eq!(response.mode, QueryMode::Filtered);
        assert_eq!(ids(&response), vec!["100", "300"]);
    }

    #[test]
    fn test_text_with_constraints_restricts_filter() {
        let c = three();
        let mut session = c.session();
        let request =
            QueryRequest::new("cadd").constraints(ConstraintSet::new().equals("Database", "1").unwrap());
        let response = c.run_query(&mut session, &request);
        assert_eq!(response.mode, QueryMode::Filtered);
        assert_eq!(ids(&response), vec!["300"]);
    }

    #[test]
    fn test_pagination_navigation() {
        let c = many(120);
        let mut session = c.session();
        let first = c.run_query(&mut session, &QueryRequest::default());
        assert_eq!(first.page, 1);

        let prev = c.previous_page(&mut session);
        assert_eq!(prev.page, 1);

        c.next_page(&mut session);
        let third = c.next_page(&mut session);
        assert_eq!(third.page, 3);
        assert_eq!(third.results.len(), 20);
        assert_eq!(third.results[0].position, 100);

        let still_third = c.next_page(&mut session);
        assert_eq!(still_third.page, 3);
    }

    #[test]
    fn test_same_request_keeps_page_new_request_resets() {
        let c = many(120);
        let mut session = c.session();
        c.run_query(&mut session, &QueryRequest::default());
        c.next_page(&mut session);

        let again = c.run_query(&mut session, &QueryRequest::default());
        assert_eq!(again.page, 2);

        let changed = c.run_query(
            &mut session,
            &QueryRequest::default().constraints(ConstraintSet::new().title("tool")),
        );
        assert_eq!(changed.page, 1);
    }

    #[test]
    fn test_go_to_page_clamps() {
        let c = many(120);
        let mut session = c.session();
        c.run_query(&mut session, &QueryRequest::default());
        assert_eq!(c.go_to_page(&mut session, 10).page, 3);
        assert_eq!(c.go_to_page(&mut session, 0).page, 1);
    }

    #[test]
    fn test_navigation_before_any_query() {
        let c = three();
        let mut session = c.session();
        let response = c.next_page(&mut session);
        assert_eq!(response.page, 1);
        assert_eq!(response.total_matches, 0);
    }

    #[test]
    fn test_get_details_orders_priority_fields() {
        let c = three();
        let record = c.find_by_identifier("300").unwrap();
        let keys: Vec<String> = c.get_details(record).into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["PubMed_ID", "Title", "Database", "Year"]);
    }
}
