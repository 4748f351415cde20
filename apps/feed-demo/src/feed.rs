//! Numbered pages served from memory.

use std::cell::Cell;
use std::convert::Infallible;

use endless_foundation::paging::{FetchDirection, Page, PageFuture, PageSource};

pub const PAGE_SIZE: i64 = 10;
pub const FIRST_CURSOR: i64 = -4;
pub const LAST_CURSOR: i64 = 4;

/// Page `n` holds `n * PAGE_SIZE ..`. Cursors stop at [`FIRST_CURSOR`] and
/// [`LAST_CURSOR`]; a fetch without a cursor starts at page 0.
#[derive(Debug, Default)]
pub struct NumberFeed {
    fetches: Cell<usize>,
}

impl NumberFeed {
    pub fn page(cursor: i64) -> Page<i64, i64> {
        let start = cursor * PAGE_SIZE;
        Page::new(
            (start..start + PAGE_SIZE).collect(),
            (cursor < LAST_CURSOR).then_some(cursor + 1),
            (cursor > FIRST_CURSOR).then_some(cursor - 1),
        )
    }

    pub fn fetches(&self) -> usize {
        self.fetches.get()
    }
}

impl PageSource for NumberFeed {
    type Item = i64;
    type Cursor = i64;
    type Error = Infallible;

    fn fetch_page(
        &self,
        direction: FetchDirection,
        cursor: Option<&i64>,
    ) -> PageFuture<i64, i64, Infallible> {
        let cursor = cursor.copied().unwrap_or(0);
        self.fetches.set(self.fetches.get() + 1);
        log::debug!("serving {direction} page {cursor}");
        Box::pin(std::future::ready(Ok(Self::page(cursor))))
    }
}
