use tracing::debug;

use crate::error::FetchError;
use crate::filter::{filter_and_sort, FilterMode};
use crate::post::PostRecord;

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Loading,
    Ready(Vec<PostRecord>),
    Failed(String),
}

/// Single-screen view state. Status changes only on load completion, the
/// filter only on user selection.
#[derive(Debug, Clone)]
pub struct FeedState {
    status: LoadStatus,
    active_filter: FilterMode,
    ticket: u64,
}

impl Default for FeedState {
    fn default() -> Self {
        Self::new(FilterMode::default())
    }
}

impl FeedState {
    /// Starts in `Loading` with the first load ticket already issued.
    pub fn new(active_filter: FilterMode) -> Self {
        Self {
            status: LoadStatus::Loading,
            active_filter,
            ticket: 0,
        }
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.status, LoadStatus::Loading)
    }

    pub fn posts(&self) -> &[PostRecord] {
        match &self.status {
            LoadStatus::Ready(posts) => posts,
            _ => &[],
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            LoadStatus::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn active_filter(&self) -> FilterMode {
        self.active_filter
    }

    pub fn set_filter(&mut self, mode: FilterMode) {
        self.active_filter = mode;
    }

    /// Ticket of the load the state is currently waiting for.
    pub fn current_ticket(&self) -> u64 {
        self.ticket
    }

    /// Goes back to `Loading` for a refresh and returns the new ticket.
    pub fn begin_load(&mut self) -> u64 {
        self.ticket += 1;
        self.status = LoadStatus::Loading;
        self.ticket
    }

    /// Applies a finished load. Returns false when the outcome was ignored
    /// because it belongs to an older ticket or the state already settled.
    pub fn apply_load(&mut self, ticket: u64, result: Result<Vec<PostRecord>, FetchError>) -> bool {
        if ticket != self.ticket {
            debug!(ticket, current = self.ticket, "ignoring stale load result");
            return false;
        }
        if !self.is_loading() {
            debug!(ticket, "ignoring duplicate load result");
            return false;
        }
        self.status = match result {
            Ok(posts) => LoadStatus::Ready(posts),
            Err(e) => LoadStatus::Failed(e.to_string()),
        };
        true
    }

    /// Posts in display order for the active filter; empty unless ready.
    pub fn visible_posts(&self) -> Vec<&PostRecord> {
        filter_and_sort(self.posts(), self.active_filter)
    }
}
