//! Cursor-based pagination over unbounded server collections.
//!
//! The collection endpoints page over an opaque, monotonically increasing
//! row id and report no total count. Each page answers with two cursors:
//! `first` (row id of the first item on the page) and `next` (row id to
//! request for the following page, `0` meaning none). There is no cursor
//! for "the page before this one".

use crate::types::Page;

/// Cursor pair carried by every page payload
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageCursor {
    /// Row id of the first item on the last received page
    pub first: i64,

    /// Cursor for the following page; 0 means no further page
    pub next: i64,
}

impl<T> From<&Page<T>> for PageCursor {
    fn from(page: &Page<T>) -> Self {
        Self {
            first: page.first,
            next: page.next,
        }
    }
}

/// The (cursor, limit) pair identifying one fetch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchKey {
    /// Cursor to request
    pub cursor: i64,

    /// Page size to request
    pub limit: usize,
}

/// Navigation state machine for one paginated view
///
/// Page-change intents combine with the cursors of the last received page
/// to produce the next cursor to request. [`PageNavigator::next_fetch`]
/// debounces on dependency equality: a given (cursor, limit) pair is handed
/// out once, so every cursor change triggers exactly one re-fetch and
/// repeated identical state triggers none.
#[derive(Clone, Debug)]
pub struct PageNavigator {
    cursor: i64,
    page: usize,
    limit: usize,
    last_fetch: Option<FetchKey>,
}

impl PageNavigator {
    /// Start at the first page (cursor 0) with the given page size
    pub fn new(limit: usize) -> Self {
        Self {
            cursor: 0,
            page: 0,
            limit,
            last_fetch: None,
        }
    }

    /// Current cursor
    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Current page index
    pub fn page(&self) -> usize {
        self.page
    }

    /// Current page size
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Apply a page-change intent against the last received page cursors.
    ///
    /// Returns whether the transition was accepted; a rejected transition
    /// leaves page and cursor untouched (the caller reverts its page
    /// control).
    ///
    /// Forward moves follow `next` and are rejected when `next == 0` (no
    /// further page). Moving back to page 0 is exact (cursor 0). Moving
    /// back to any interior page is a known approximation: the protocol
    /// carries no backward cursor, so the navigator re-requests `first`,
    /// the start of the *current* page, not the true previous one. Exact
    /// backward navigation would need a server-side cursor stack.
    pub fn change_page(&mut self, requested: usize, last: Option<&PageCursor>) -> bool {
        if requested == self.page {
            return false;
        }

        if requested > self.page {
            match last {
                Some(cursor) if cursor.next != 0 => {
                    self.cursor = cursor.next;
                    self.page = requested;
                    true
                }
                _ => false,
            }
        } else if requested == 0 {
            self.cursor = 0;
            self.page = 0;
            true
        } else {
            match last {
                Some(cursor) => {
                    self.cursor = cursor.first;
                    self.page = requested;
                    true
                }
                None => false,
            }
        }
    }

    /// Change the page size, resetting to the first page
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit;
        self.cursor = 0;
        self.page = 0;
    }

    /// The fetch to perform now, if the (cursor, limit) pair changed since
    /// the last fetch handed out
    pub fn next_fetch(&mut self) -> Option<FetchKey> {
        let key = FetchKey {
            cursor: self.cursor,
            limit: self.limit,
        };
        if self.last_fetch == Some(key) {
            return None;
        }
        self.last_fetch = Some(key);
        Some(key)
    }
}
