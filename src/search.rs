//! Search state machine: decides what to fetch and folds pages into one list.
//!
//! The engine never performs I/O. `search`/`load_more` hand back the request to
//! issue (or `None` when nothing should be fetched), and the caller feeds the
//! outcome back through `apply_result`/`apply_error` together with the
//! request's `generation`, so superseded answers are dropped. Debouncing lives in
//! [`crate::debounce`]; the dashboard calls `search(.., 0)` when the quiet
//! period ends.

use crate::api::{ApiError, EventSearchResult, EventSummary};
use crate::filters::FiltersState;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const SORT_DATE_ASC: &str = "date,asc";

/// Parameters for one `GET /events.json` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub keyword: Option<String>,
    pub city: Option<String>,
    pub page: u32,
    pub size: u32,
    pub sort: &'static str,
    pub classification_name: Option<String>,
    /// Search generation this request belongs to; set by [`SearchEngine`]
    pub generation: u64,
}

impl SearchRequest {
    /// `None` when both keyword and city are blank.
    pub fn from_filters(filters: &FiltersState, page: u32, size: u32) -> Option<Self> {
        let keyword = Some(filters.keyword.trim()).filter(|k| !k.is_empty());
        let city = Some(filters.city.trim()).filter(|c| !c.is_empty());

        if keyword.is_none() && city.is_none() {
            return None;
        }

        Some(Self {
            keyword: keyword.map(str::to_string),
            city: city.map(str::to_string),
            page,
            size,
            sort: SORT_DATE_ASC,
            classification_name: filters.category.classification_name().map(str::to_string),
            generation: 0,
        })
    }

    /// Query string pairs, omitting absent optional parameters
    pub fn query_pairs(&self, api_key: &str) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("apikey", api_key.to_string())];
        if let Some(keyword) = &self.keyword {
            pairs.push(("keyword", keyword.clone()));
        }
        if let Some(city) = &self.city {
            pairs.push(("city", city.clone()));
        }
        pairs.push(("page", self.page.to_string()));
        pairs.push(("size", self.size.to_string()));
        pairs.push(("sort", self.sort.to_string()));
        if let Some(classification) = &self.classification_name {
            pairs.push(("classificationName", classification.clone()));
        }
        pairs
    }
}

/// Why a request is in flight; drives which loading indicator is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// First page with nothing on screen yet
    Initial,
    /// Page 0 again while results are showing
    Refresh,
    /// Next page, appended below the current list
    LoadMore,
}

#[derive(Debug)]
pub struct SearchEngine {
    page_size: u32,
    results: Vec<EventSummary>,
    current_page: u32,
    total_pages: u32,
    total_elements: u64,
    has_more_results: bool,
    has_searched: bool,
    // bumped by every page-0 search and by reset; responses carry the value
    // they were issued under
    generation: u64,
    in_flight: Option<FetchKind>,
    error_message: Option<String>,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl SearchEngine {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            results: Vec::new(),
            current_page: 0,
            total_pages: 0,
            total_elements: 0,
            has_more_results: true,
            has_searched: false,
            generation: 0,
            in_flight: None,
            error_message: None,
        }
    }

    /// Start a fetch of `page` for `filters`.
    ///
    /// Returns `None` (and changes nothing) when keyword and city are both
    /// blank, or when a page > 0 is asked for while a request is in flight or
    /// no further pages exist. A page-0 search supersedes whatever is in
    /// flight; its `generation` is the only one whose responses still apply.
    pub fn search(&mut self, filters: &FiltersState, page: u32) -> Option<SearchRequest> {
        let mut request = SearchRequest::from_filters(filters, page, self.page_size)?;

        let kind = if page > 0 {
            if self.in_flight.is_some() || !self.has_more_results {
                tracing::debug!(page, in_flight = ?self.in_flight, "load more suppressed");
                return None;
            }
            FetchKind::LoadMore
        } else if self.has_searched {
            FetchKind::Refresh
        } else {
            FetchKind::Initial
        };

        if page == 0 {
            self.generation += 1;
        }
        request.generation = self.generation;

        tracing::info!(
            page,
            ?kind,
            generation = self.generation,
            keyword = ?request.keyword,
            city = ?request.city,
            "search issued"
        );

        self.in_flight = Some(kind);
        self.has_searched = true;
        self.error_message = None;
        Some(request)
    }

    /// Fetch the page after the last one received.
    pub fn load_more(&mut self, filters: &FiltersState) -> Option<SearchRequest> {
        if !self.has_searched {
            return None;
        }
        let next = self.current_page.saturating_add(1);
        self.search(filters, next)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.has_searched && generation == self.generation
    }

    /// Fold a successful page into the accumulated list. Pages from a
    /// superseded search or from before a reset are dropped.
    pub fn apply_result(&mut self, generation: u64, result: EventSearchResult) {
        if !self.is_current(generation) {
            tracing::debug!(
                page = result.page,
                generation,
                current = self.generation,
                "dropping superseded response"
            );
            return;
        }

        if result.page == 0 {
            self.results = result.events;
        } else {
            self.results.extend(result.events);
        }

        self.current_page = result.page;
        self.total_pages = result.total_pages;
        self.total_elements = result.total_elements;
        self.has_more_results = result.page.saturating_add(1) < result.total_pages;
        self.in_flight = None;
        self.error_message = None;

        tracing::debug!(
            page = self.current_page,
            total_pages = self.total_pages,
            accumulated = self.results.len(),
            has_more = self.has_more_results,
            "page applied"
        );
    }

    /// Record a failed fetch. Already loaded pages stay put.
    pub fn apply_error(&mut self, generation: u64, error: &ApiError) {
        if !self.is_current(generation) {
            tracing::debug!(generation, current = self.generation, error = %error, "dropping superseded failure");
            return;
        }
        tracing::warn!(error = %error, "search failed");
        self.in_flight = None;
        self.error_message = Some(error.user_message());
    }

    /// Back to the initial, never-searched state with default filters.
    pub fn reset(&mut self, filters: &mut FiltersState) {
        filters.reset_filters();
        let page_size = self.page_size;
        let generation = self.generation + 1;
        *self = Self::new(page_size);
        self.generation = generation;
    }

    /// Generation of the latest page-0 search.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn results(&self) -> &[EventSummary] {
        &self.results
    }

    pub fn has_more_results(&self) -> bool {
        self.has_more_results
    }

    pub fn has_searched(&self) -> bool {
        self.has_searched
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight == Some(FetchKind::Refresh)
    }

    pub fn is_loading_more(&self) -> bool {
        self.in_flight == Some(FetchKind::LoadMore)
    }

    pub fn is_initial_loading(&self) -> bool {
        self.is_fetching() && self.results.is_empty()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debounce::Debouncer;
    use crate::filters::{EventCategory, FiltersUpdate};
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn event(id: &str) -> EventSummary {
        EventSummary {
            id: id.to_string(),
            name: format!("Event {}", id),
            date: "TBD".to_string(),
            formatted_date: "Date TBD".to_string(),
            ..EventSummary::default()
        }
    }

    fn page(number: u32, total_pages: u32, ids: &[&str]) -> EventSearchResult {
        EventSearchResult {
            events: ids.iter().map(|id| event(id)).collect(),
            page: number,
            total_pages,
            total_elements: 0,
        }
    }

    fn filters(keyword: &str, city: &str) -> FiltersState {
        FiltersState {
            keyword: keyword.to_string(),
            city: city.to_string(),
            category: EventCategory::All,
        }
    }

    fn ids(engine: &SearchEngine) -> Vec<&str> {
        engine.results().iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_blank_filters_issue_nothing() {
        let mut engine = SearchEngine::default();
        assert!(engine.search(&filters("  ", ""), 0).is_none());
        assert!(!engine.has_searched());
        assert!(!engine.is_fetching());
    }

    #[test]
    fn test_keyword_only_request_params() {
        let mut engine = SearchEngine::default();
        let request = engine.search(&filters("jazz", ""), 0).unwrap();
        let pairs = request.query_pairs("secret");

        let get = |name: &str| {
            pairs
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.as_str())
        };
        assert_eq!(get("apikey"), Some("secret"));
        assert_eq!(get("keyword"), Some("jazz"));
        assert_eq!(get("city"), None);
        assert_eq!(get("classificationName"), None);
        assert_eq!(get("page"), Some("0"));
        assert_eq!(get("size"), Some("20"));
        assert_eq!(get("sort"), Some("date,asc"));
    }

    #[test]
    fn test_request_trims_and_maps_category() {
        let state = FiltersState {
            keyword: "  rock ".to_string(),
            city: " Austin ".to_string(),
            category: EventCategory::ArtsAndTheatre,
        };
        let request = SearchRequest::from_filters(&state, 2, 50).unwrap();
        assert_eq!(request.keyword.as_deref(), Some("rock"));
        assert_eq!(request.city.as_deref(), Some("Austin"));
        assert_eq!(request.classification_name.as_deref(), Some("Arts & Theatre"));
        assert_eq!(request.page, 2);
        assert_eq!(request.size, 50);
    }

    #[test]
    fn test_pages_accumulate_in_fetch_order() {
        let mut engine = SearchEngine::default();
        let state = filters("jazz", "");

        engine.search(&state, 0).unwrap();
        engine.apply_result(engine.generation(), page(0, 3, &["a", "b"]));
        assert!(engine.has_more_results());

        engine.load_more(&state).unwrap();
        engine.apply_result(engine.generation(), page(1, 3, &["c", "d"]));
        assert!(engine.has_more_results());

        let request = engine.load_more(&state).unwrap();
        assert_eq!(request.page, 2);
        engine.apply_result(engine.generation(), page(2, 3, &["e"]));
        assert!(!engine.has_more_results());

        assert_eq!(ids(&engine), vec!["a", "b", "c", "d", "e"]);
        assert!(engine.load_more(&state).is_none());
    }

    #[test]
    fn test_page_zero_replaces_results() {
        let mut engine = SearchEngine::default();
        let state = filters("", "Paris");

        engine.search(&state, 0).unwrap();
        engine.apply_result(engine.generation(), page(0, 2, &["a", "b"]));

        engine.search(&state, 0).unwrap();
        assert!(engine.is_refreshing());
        assert_eq!(ids(&engine), vec!["a", "b"]);

        engine.apply_result(engine.generation(), page(0, 2, &["z"]));
        assert_eq!(ids(&engine), vec!["z"]);
        assert!(!engine.is_refreshing());
    }

    #[test]
    fn test_load_more_suppressed_while_in_flight() {
        let mut engine = SearchEngine::default();
        let state = filters("jazz", "");

        engine.search(&state, 0).unwrap();
        engine.apply_result(engine.generation(), page(0, 5, &["a"]));

        assert!(engine.load_more(&state).is_some());
        assert!(engine.is_loading_more());
        assert!(engine.load_more(&state).is_none());
    }

    #[test]
    fn test_load_more_before_any_search_is_noop() {
        let mut engine = SearchEngine::default();
        assert!(engine.load_more(&filters("jazz", "")).is_none());
    }

    #[test]
    fn test_failed_load_more_keeps_loaded_pages() {
        let mut engine = SearchEngine::default();
        let state = filters("jazz", "");

        engine.search(&state, 0).unwrap();
        engine.apply_result(engine.generation(), page(0, 3, &["a", "b"]));
        engine.load_more(&state).unwrap();
        engine.apply_error(engine.generation(), &ApiError::Status(503));

        assert_eq!(ids(&engine), vec!["a", "b"]);
        assert_eq!(engine.error_message(), Some("Request failed with status 503"));
        assert!(!engine.is_fetching());
        assert_eq!(engine.current_page(), 0);

        // the same page can be retried
        assert_eq!(engine.load_more(&state).unwrap().page, 1);
    }

    #[test]
    fn test_superseded_load_more_is_not_appended() {
        let mut engine = SearchEngine::default();

        engine.search(&filters("jazz", ""), 0).unwrap();
        engine.apply_result(engine.generation(), page(0, 5, &["jazz0"]));
        let jazz_more = engine.load_more(&filters("jazz", "")).unwrap();
        assert_eq!(jazz_more.page, 1);

        let rock = engine.search(&filters("rock", ""), 0).unwrap();
        assert_ne!(rock.generation, jazz_more.generation);
        engine.apply_result(rock.generation, page(0, 2, &["rock0"]));
        engine.apply_result(jazz_more.generation, page(1, 5, &["jazz1"]));

        assert_eq!(ids(&engine), vec!["rock0"]);
        assert_eq!(engine.current_page(), 0);
        assert_eq!(engine.total_pages(), 2);
        assert!(engine.has_more_results());
        assert!(!engine.is_fetching());
    }

    #[test]
    fn test_fetching_until_latest_search_answers() {
        let mut engine = SearchEngine::default();
        let state = filters("jazz", "");

        engine.search(&state, 0).unwrap();
        engine.apply_result(engine.generation(), page(0, 5, &["a"]));
        let more = engine.load_more(&state).unwrap();
        let refresh = engine.search(&state, 0).unwrap();
        assert!(engine.is_refreshing());

        // the older load-more lands first
        engine.apply_result(more.generation, page(1, 5, &["b"]));
        assert!(engine.is_fetching());
        assert!(engine.is_refreshing());
        assert!(engine.load_more(&state).is_none());
        assert_eq!(ids(&engine), vec!["a"]);

        engine.apply_result(refresh.generation, page(0, 5, &["z"]));
        assert!(!engine.is_fetching());
        assert_eq!(ids(&engine), vec!["z"]);
        assert_eq!(engine.load_more(&state).unwrap().page, 1);
    }

    #[test]
    fn test_stale_page_zero_does_not_replace_newer_results() {
        let mut engine = SearchEngine::default();
        let first = engine.search(&filters("jazz", ""), 0).unwrap();
        let second = engine.search(&filters("jazz club", ""), 0).unwrap();

        engine.apply_result(second.generation, page(0, 1, &["new"]));
        engine.apply_result(first.generation, page(0, 1, &["old"]));
        assert_eq!(ids(&engine), vec!["new"]);
    }

    #[test]
    fn test_failure_of_replaced_request_is_ignored() {
        let mut engine = SearchEngine::default();
        let state = filters("jazz", "");

        engine.search(&state, 0).unwrap();
        engine.apply_result(engine.generation(), page(0, 3, &["a"]));
        let more = engine.load_more(&state).unwrap();
        let refresh = engine.search(&state, 0).unwrap();

        engine.apply_error(more.generation, &ApiError::Status(500));
        assert_eq!(engine.error_message(), None);
        assert!(engine.is_refreshing());

        engine.apply_error(refresh.generation, &ApiError::Status(503));
        assert_eq!(engine.error_message(), Some("Request failed with status 503"));
        assert!(!engine.is_fetching());
        assert_eq!(ids(&engine), vec!["a"]);
    }

    #[test]
    fn test_response_from_before_reset_ignored_by_next_search() {
        let mut engine = SearchEngine::default();
        let mut state = filters("jazz", "");
        let before = engine.search(&state, 0).unwrap();

        engine.reset(&mut state);
        let after = engine.search(&filters("", "Berlin"), 0).unwrap();
        assert_ne!(before.generation, after.generation);

        engine.apply_result(before.generation, page(0, 1, &["jazz0"]));
        assert!(engine.results().is_empty());
        assert!(engine.is_initial_loading());
    }

    #[test]
    fn test_new_search_clears_error() {
        let mut engine = SearchEngine::default();
        let state = filters("jazz", "");
        engine.search(&state, 0).unwrap();
        engine.apply_error(engine.generation(), &ApiError::Transport("offline".to_string()));
        assert_eq!(engine.error_message(), Some("offline"));

        engine.search(&state, 0).unwrap();
        assert_eq!(engine.error_message(), None);
    }

    #[test]
    fn test_reset_returns_to_unsearched_state() {
        let mut engine = SearchEngine::default();
        let mut state = FiltersState {
            keyword: "jazz".to_string(),
            city: "Austin".to_string(),
            category: EventCategory::Music,
        };
        let issued = engine.search(&state, 0).unwrap();
        engine.apply_result(issued.generation, page(0, 2, &["a"]));

        engine.reset(&mut state);
        assert_eq!(state, FiltersState::default());
        assert!(engine.results().is_empty());
        assert!(!engine.has_searched());
        assert!(engine.has_more_results());

        // a response that was still in flight is ignored
        engine.apply_result(issued.generation, page(0, 2, &["late"]));
        assert!(engine.results().is_empty());
    }

    #[test]
    fn test_initial_loading_flag() {
        let mut engine = SearchEngine::default();
        engine.search(&filters("jazz", ""), 0).unwrap();
        assert!(engine.is_initial_loading());
        assert!(!engine.is_refreshing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounced_edits_issue_one_request() {
        let mut state = FiltersState::default();
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();
        let mut debouncer = Debouncer::new(Duration::from_millis(400));

        for keyword in ["j", "ja", "jazz"] {
            state.update_filters(FiltersUpdate {
                keyword: Some(keyword.to_string()),
                ..FiltersUpdate::default()
            });
            let tx = tx.clone();
            debouncer.trigger(move || {
                tx.send(()).ok();
            });
            tokio::time::sleep(Duration::from_millis(40)).await;
        }

        tokio::time::sleep(Duration::from_millis(500)).await;

        let mut engine = SearchEngine::default();
        let mut requests = Vec::new();
        while let Ok(()) = rx.try_recv() {
            requests.extend(engine.search(&state, 0));
        }

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].keyword.as_deref(), Some("jazz"));
        assert_eq!(requests[0].page, 0);
    }
}
