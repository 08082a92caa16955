use callboard_api::CallPage;
use callboard_core::call::splice_by_id;
use callboard_core::{Call, CallFilter, PageRange, Pagination};
use tracing::debug;

use crate::status::{error_or, RequestStatus};

pub const FETCH_FAILED: &str = "Failed to load calls";
pub const ADD_NOTE_FAILED: &str = "Failed to add note";
pub const ARCHIVE_FAILED: &str = "Failed to archive/unarchive";

/// The call list: the authoritative page, the filtered view derived from it,
/// and the pagination/request bookkeeping around them.
///
/// `calls` is only ever produced by `active_filter.apply(&backup_calls)` or
/// by a splice that is applied to both collections at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallsState {
    /// Displayed set.
    pub calls: Vec<Call>,
    /// Authoritative set: the page exactly as fetched.
    pub backup_calls: Vec<Call>,
    pub status: RequestStatus,
    pub error: Option<String>,
    pub pagination: Pagination,
    pub active_filter: CallFilter,
    /// Id of the most recently issued fetch. Results for older ids are stale.
    pub latest_fetch_id: u64,
}

impl CallsState {
    // ── Selectors ─────────────────────────────────────────────────────

    pub fn is_loading(&self) -> bool {
        self.status == RequestStatus::Loading
    }

    pub fn total_pages(&self) -> u64 {
        self.pagination.total_pages()
    }

    pub fn range(&self) -> PageRange {
        self.pagination.range()
    }

    pub fn find(&self, id: &str) -> Option<&Call> {
        self.backup_calls.iter().find(|c| c.id == id)
    }

    // ── Reducers ──────────────────────────────────────────────────────

    pub(crate) fn filter(&mut self, key: &str) {
        self.active_filter = CallFilter::parse(key);
        self.calls = self.active_filter.apply(&self.backup_calls);
    }

    pub(crate) fn set_page(&mut self, page: u32) {
        self.pagination.page = page.max(1);
    }

    pub(crate) fn set_per_page(&mut self, per_page: u32) {
        self.pagination.per_page = per_page.max(1);
    }

    pub(crate) fn clear(&mut self) {
        self.calls.clear();
        self.backup_calls.clear();
        self.pagination.total_count = 0;
        self.pagination.has_next_page = false;
        self.pagination.page = 1;
        self.status = RequestStatus::Idle;
        self.error = None;
    }

    /// Splice a pushed snapshot into both collections. Unknown ids are
    /// ignored.
    pub(crate) fn apply_call_update(&mut self, updated: &Call) -> bool {
        self.splice(updated)
    }

    pub(crate) fn fetch_pending(&mut self) -> u64 {
        self.latest_fetch_id += 1;
        self.status = RequestStatus::Loading;
        self.error = None;
        self.latest_fetch_id
    }

    pub(crate) fn fetch_settled(&mut self, request_id: u64, result: Result<CallPage, String>) {
        if request_id != self.latest_fetch_id {
            debug!(
                request_id,
                latest = self.latest_fetch_id,
                "discarding stale call page"
            );
            return;
        }
        match result {
            Ok(page) => {
                self.status = RequestStatus::Succeeded;
                self.pagination.total_count = page.total_count;
                self.pagination.has_next_page = page.has_next_page;
                self.backup_calls = page.nodes;
                self.calls = self.active_filter.apply(&self.backup_calls);
            }
            Err(e) => {
                self.status = RequestStatus::Failed;
                self.error = Some(error_or(e, FETCH_FAILED));
            }
        }
    }

    /// Apply the outcome of a note or archive mutation. Failure leaves every
    /// record untouched and only records the error.
    pub(crate) fn mutation_settled(&mut self, result: Result<Call, String>, default_error: &str) {
        match result {
            Ok(updated) => {
                self.splice(&updated);
                self.error = None;
            }
            Err(e) => {
                self.error = Some(error_or(e, default_error));
            }
        }
    }

    fn splice(&mut self, updated: &Call) -> bool {
        let in_view = splice_by_id(&mut self.calls, updated);
        let in_backup = splice_by_id(&mut self.backup_calls, updated);
        in_view || in_backup
    }
}
