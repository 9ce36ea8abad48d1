//! List fetch lifecycle.
//!
//! Every fetch goes `begin` → (`Loading`) → `complete`.  Starting a fetch
//! clears any visible error, so at most one error is shown at a time.  A
//! failed fetch leaves the previously rendered page in place and shows the
//! error above it.
//!
//! Requests are never cancelled.  With [`ResponseOrdering::LastResponse`]
//! whichever answer arrives last is applied; with
//! [`ResponseOrdering::LatestRequest`] answers older than one already
//! applied are dropped.

use clap::ValueEnum;
use tracing::{debug, warn};

use crate::api::ListResponse;
use crate::error::{ClientError, ClientResult};
use crate::query::QueryState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ResponseOrdering {
    /// Apply responses in arrival order.
    #[default]
    LastResponse,
    /// Drop responses to requests older than the newest applied one.
    LatestRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Failed,
    Discarded,
}

#[derive(Debug, Default)]
pub struct ListFetcher {
    ordering: ResponseOrdering,
    next_seq: u64,
    applied_seq: u64,
    state: FetchState,
}

impl ListFetcher {
    pub fn new(ordering: ResponseOrdering) -> Self {
        Self {
            ordering,
            ..Default::default()
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == FetchState::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            FetchState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Start a fetch: clear the error, enter `Loading`, hand out a sequence
    /// number for the request.
    pub fn begin(&mut self) -> u64 {
        self.next_seq += 1;
        self.state = FetchState::Loading;
        self.next_seq
    }

    /// Apply the result of request `seq`.
    ///
    /// On success the server-reported page overwrites the query's page and
    /// the response is returned for rendering.
    pub fn complete(
        &mut self,
        seq: u64,
        result: ClientResult<ListResponse>,
        query: &mut QueryState,
    ) -> (Outcome, Option<ListResponse>) {
        if self.ordering == ResponseOrdering::LatestRequest && seq < self.applied_seq {
            debug!(seq, applied = self.applied_seq, "dropping stale list response");
            return (Outcome::Discarded, None);
        }
        self.applied_seq = self.applied_seq.max(seq);

        match result {
            Ok(response) => {
                query.reconcile(response.current_page);
                self.state = FetchState::Ready;
                (Outcome::Applied, Some(response))
            }
            Err(err) => {
                warn!(seq, error = %err, "list fetch failed");
                let message = match err {
                    ClientError::Application { message } => message,
                    other => format!("Failed to load data: {other}"),
                };
                self.state = FetchState::Failed(message);
                (Outcome::Failed, None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(current: u32) -> ClientResult<ListResponse> {
        Ok(ListResponse {
            total_pages: 10,
            current_page: Some(current),
            ..Default::default()
        })
    }

    #[test]
    fn begin_clears_previous_error() {
        let mut f = ListFetcher::default();
        let mut q = QueryState::default();
        let seq = f.begin();
        f.complete(seq, Err(ClientError::application("boom")), &mut q);
        assert_eq!(f.error(), Some("boom"));

        f.begin();
        assert_eq!(f.error(), None);
        assert!(f.is_loading());
    }

    #[test]
    fn success_reconciles_page_with_server() {
        let mut f = ListFetcher::default();
        let mut q = QueryState::default();
        q.set_page(5);
        let seq = f.begin();
        let (outcome, response) = f.complete(seq, page(3), &mut q);
        assert_eq!(outcome, Outcome::Applied);
        assert!(response.is_some());
        assert_eq!(q.page(), 3);
        assert_eq!(f.state(), &FetchState::Ready);
    }

    #[test]
    fn failure_keeps_requested_page() {
        let mut f = ListFetcher::default();
        let mut q = QueryState::default();
        q.set_page(5);
        let seq = f.begin();
        let (outcome, response) = f.complete(seq, Err(ClientError::Http { status: 500 }), &mut q);
        assert_eq!(outcome, Outcome::Failed);
        assert_eq!(f.error(), Some("Failed to load data: HTTP error, status 500"));
        assert!(response.is_none());
        assert_eq!(q.page(), 5);
    }

    #[test]
    fn last_response_wins_by_default() {
        let mut f = ListFetcher::default();
        let mut q = QueryState::default();
        let first = f.begin();
        let second = f.begin();

        assert_eq!(f.complete(second, page(2), &mut q).0, Outcome::Applied);
        assert_eq!(f.complete(first, page(1), &mut q).0, Outcome::Applied);
        assert_eq!(q.page(), 1, "late answer to the older request overwrites");
    }

    #[test]
    fn latest_request_ordering_drops_stale_answers() {
        let mut f = ListFetcher::new(ResponseOrdering::LatestRequest);
        let mut q = QueryState::default();
        let first = f.begin();
        let second = f.begin();

        assert_eq!(f.complete(second, page(2), &mut q).0, Outcome::Applied);
        assert_eq!(f.complete(first, page(1), &mut q).0, Outcome::Discarded);
        assert_eq!(q.page(), 2);
    }

    #[test]
    fn latest_request_ordering_applies_in_order_answers() {
        let mut f = ListFetcher::new(ResponseOrdering::LatestRequest);
        let mut q = QueryState::default();
        let first = f.begin();
        let second = f.begin();

        assert_eq!(f.complete(first, page(1), &mut q).0, Outcome::Applied);
        assert_eq!(f.complete(second, page(2), &mut q).0, Outcome::Applied);
        assert_eq!(q.page(), 2);
    }
}
