//! Query state and request construction.
//!
//! [`QueryState`] is the single owner of "which page of which source, under
//! which filter" the list view asks for next.  Every mutator that narrows or
//! changes the result set resets the page to 1; the only way the page moves
//! otherwise is an explicit page selection or reconciliation with the page
//! the server reports back.
//!
//! [`build_request`] is a pure function of that state.

use clap::ValueEnum;

use crate::catalog::SourceKind;

/// Lookback window used when nothing else is configured.
pub const DEFAULT_DAYS: u32 = 7;

/// How pagination is expressed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PaginationStyle {
    /// `limit=N&offset=(page-1)*N`
    Offset,
    /// `page=P&limit=N`
    Page,
}

/// Page size and wire style for list requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListConfig {
    pub page_size: u32,
    pub style: PaginationStyle,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            style: PaginationStyle::Offset,
        }
    }
}

/// A single active equality filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryState {
    source: String,
    page: u32,
    filter: Option<Filter>,
    days_window: u32,
    search_query: String,
}

impl Default for QueryState {
    fn default() -> Self {
        Self::new("all", DEFAULT_DAYS)
    }
}

impl QueryState {
    pub fn new(source: impl Into<String>, days_window: u32) -> Self {
        Self {
            source: source.into(),
            page: 1,
            filter: None,
            days_window: days_window.max(1),
            search_query: String::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn filter(&self) -> Option<&Filter> {
        self.filter.as_ref()
    }

    pub fn days_window(&self) -> u32 {
        self.days_window
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Switch collection.  Filters are source-specific, so they are dropped.
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
        self.filter = None;
        self.page = 1;
    }

    /// Set or clear the equality filter.  An empty value clears it.
    pub fn set_filter(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        self.filter = if value.is_empty() {
            None
        } else {
            Some(Filter {
                field: field.into(),
                value,
            })
        };
        self.page = 1;
    }

    pub fn clear_filter(&mut self) {
        self.filter = None;
        self.page = 1;
    }

    pub fn set_days_window(&mut self, days: u32) {
        self.days_window = days.max(1);
        self.page = 1;
    }

    /// Surrounding whitespace is not part of the query.
    pub fn set_search_query(&mut self, query: &str) {
        self.search_query = query.trim().to_string();
        self.page = 1;
    }

    /// Request a specific page.  Page numbers are 1-based.
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Adopt the page the server says it served.
    ///
    /// The server is the authority on valid page numbers (it clamps
    /// out-of-range requests), so its answer overwrites whatever was asked
    /// for.  Endpoints that do not report a page leave the request as is.
    pub fn reconcile(&mut self, server_page: Option<u32>) {
        if let Some(page) = server_page {
            self.page = page.max(1);
        }
    }
}

/// Path plus query parameters, ready to be joined onto the API base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub kind: SourceKind,
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl ListRequest {
    #[cfg(test)]
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Build the list request for the current state.
///
/// News sources go to `/api/news` with the configured pagination style.
/// Social sources go to `/api/social_media/{source}`, which only understands
/// `page` and `days`.
pub fn build_request(state: &QueryState, kind: SourceKind, config: &ListConfig) -> ListRequest {
    let mut params: Vec<(String, String)> = Vec::new();
    let path = match kind {
        SourceKind::News => {
            params.push(("source".into(), state.source.clone()));
            push_pagination(&mut params, state.page, config.page_size, config.style);
            "/api/news".to_string()
        }
        SourceKind::Social => {
            params.push(("page".into(), state.page.to_string()));
            params.push(("days".into(), state.days_window.to_string()));
            format!("/api/social_media/{}", state.source)
        }
    };

    if let Some(filter) = &state.filter {
        params.push((filter.field.clone(), filter.value.clone()));
    }
    if !state.search_query.is_empty() {
        params.push(("search".into(), state.search_query.clone()));
    }

    ListRequest { kind, path, params }
}

fn push_pagination(params: &mut Vec<(String, String)>, page: u32, limit: u32, style: PaginationStyle) {
    let limit = limit.max(1);
    match style {
        PaginationStyle::Offset => {
            let offset = u64::from(page.saturating_sub(1)) * u64::from(limit);
            params.push(("limit".into(), limit.to_string()));
            params.push(("offset".into(), offset.to_string()));
        }
        PaginationStyle::Page => {
            params.push(("page".into(), page.to_string()));
            params.push(("limit".into(), limit.to_string()));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn state_on_page(page: u32) -> QueryState {
        let mut s = QueryState::new("telegram", 7);
        s.set_page(page);
        s
    }

    // -- reset-on-change -----------------------------------------------------

    #[test]
    fn changing_days_resets_page() {
        let mut s = state_on_page(5);
        s.set_days_window(30);
        assert_eq!(s.page(), 1);
        assert_eq!(s.days_window(), 30);
    }

    #[test]
    fn changing_filter_resets_page() {
        let mut s = state_on_page(5);
        s.set_filter("telegram_channel", "rian_ru");
        assert_eq!(s.page(), 1);
        assert_eq!(s.filter().unwrap().value, "rian_ru");
    }

    #[test]
    fn changing_source_resets_page_and_clears_filter() {
        let mut s = state_on_page(5);
        s.set_filter("telegram_channel", "rian_ru");
        s.set_page(3);
        s.set_source("ria");
        assert_eq!(s.page(), 1);
        assert!(s.filter().is_none());
    }

    #[test]
    fn changing_search_resets_page_and_trims() {
        let mut s = state_on_page(5);
        s.set_search_query("  drone  ");
        assert_eq!(s.page(), 1);
        assert_eq!(s.search_query(), "drone");
    }

    #[test]
    fn empty_filter_value_clears_filter() {
        let mut s = state_on_page(2);
        s.set_filter("category", "ukraine");
        s.set_filter("category", "");
        assert!(s.filter().is_none());
    }

    #[test]
    fn page_and_days_never_drop_below_one() {
        let mut s = QueryState::new("all", 0);
        assert_eq!(s.days_window(), 1);
        s.set_page(0);
        assert_eq!(s.page(), 1);
    }

    // -- reconciliation ------------------------------------------------------

    #[test]
    fn server_page_overwrites_requested_page() {
        let mut s = state_on_page(5);
        s.reconcile(Some(3));
        assert_eq!(s.page(), 3);
    }

    #[test]
    fn missing_server_page_keeps_request() {
        let mut s = state_on_page(5);
        s.reconcile(None);
        assert_eq!(s.page(), 5);
    }

    // -- request building ----------------------------------------------------

    #[test]
    fn news_request_uses_limit_offset() {
        let mut s = QueryState::new("ria", 7);
        s.set_page(3);
        let req = build_request(&s, SourceKind::News, &ListConfig::default());
        assert_eq!(req.path, "/api/news");
        assert_eq!(req.param("source"), Some("ria"));
        assert_eq!(req.param("limit"), Some("20"));
        assert_eq!(req.param("offset"), Some("40"));
        assert_eq!(req.param("page"), None);
        assert_eq!(req.param("search"), None);
    }

    #[test]
    fn news_request_page_style() {
        let mut s = QueryState::new("ria", 7);
        s.set_page(4);
        let config = ListConfig {
            page_size: 10,
            style: PaginationStyle::Page,
        };
        let req = build_request(&s, SourceKind::News, &config);
        assert_eq!(req.param("page"), Some("4"));
        assert_eq!(req.param("limit"), Some("10"));
        assert_eq!(req.param("offset"), None);
    }

    #[test]
    fn filter_and_search_become_params() {
        let mut s = QueryState::new("telegram", 7);
        s.set_filter("telegram_channel", "rian ru");
        s.set_search_query("обстрел");
        let req = build_request(&s, SourceKind::News, &ListConfig::default());
        assert_eq!(req.param("telegram_channel"), Some("rian ru"));
        assert_eq!(req.param("search"), Some("обстрел"));
    }

    #[test]
    fn social_request_uses_page_and_days_in_path() {
        let mut s = QueryState::new("vk", 14);
        s.set_page(2);
        let req = build_request(&s, SourceKind::Social, &ListConfig::default());
        assert_eq!(req.path, "/api/social_media/vk");
        assert_eq!(req.param("page"), Some("2"));
        assert_eq!(req.param("days"), Some("14"));
        assert_eq!(req.param("source"), None);
    }

    #[test]
    fn build_is_deterministic() {
        let s = QueryState::new("all", 7);
        let a = build_request(&s, SourceKind::News, &ListConfig::default());
        let b = build_request(&s, SourceKind::News, &ListConfig::default());
        assert_eq!(a, b);
    }
}
