//! Page sources for tests and demos.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use endless_foundation::paging::{FetchDirection, Page, PageFuture, PageSource};

/// Numbered pages: page `n` holds `n * page_size ..` and cursors run from
/// `min_cursor` to `max_cursor` inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NumberFeed {
    pub page_size: i64,
    pub min_cursor: i64,
    pub max_cursor: i64,
}

impl Default for NumberFeed {
    fn default() -> Self {
        Self {
            page_size: 10,
            min_cursor: -4,
            max_cursor: 4,
        }
    }
}

impl NumberFeed {
    pub fn page(&self, cursor: i64) -> Page<i64, i64> {
        let start = cursor * self.page_size;
        Page::new(
            (start..start + self.page_size).collect(),
            (cursor < self.max_cursor).then_some(cursor + 1),
            (cursor > self.min_cursor).then_some(cursor - 1),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedError(pub String);

impl fmt::Display for ScriptedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ScriptedError {}

/// One `fetch_page` call as the source saw it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchCall {
    pub direction: FetchDirection,
    pub cursor: Option<i64>,
}

type FetchResult = Result<Page<i64, i64>, ScriptedError>;

#[derive(Default)]
struct Slot {
    result: Option<FetchResult>,
    waker: Option<Waker>,
}

struct DeferredPage {
    slot: Rc<RefCell<Slot>>,
}

impl Future for DeferredPage {
    type Output = FetchResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.slot.borrow_mut();
        match slot.result.take() {
            Some(result) => Poll::Ready(result),
            None => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

struct PendingFetch {
    call: FetchCall,
    slot: Rc<RefCell<Slot>>,
}

#[derive(Default)]
struct ScriptState {
    feed: NumberFeed,
    deferred: bool,
    calls: Vec<FetchCall>,
    pending: VecDeque<PendingFetch>,
    failures: VecDeque<String>,
}

/// [`NumberFeed`] behind a scriptable [`PageSource`].
///
/// Clones share state, so a test keeps one clone while the controller owns the
/// other. In deferred mode nothing resolves until `resolve`/`reject` is called.
#[derive(Clone, Default)]
pub struct ScriptedPageSource {
    state: Rc<RefCell<ScriptState>>,
}

impl ScriptedPageSource {
    pub fn new(feed: NumberFeed) -> Self {
        let source = Self::default();
        source.state.borrow_mut().feed = feed;
        source
    }

    pub fn deferred(self) -> Self {
        self.state.borrow_mut().deferred = true;
        self
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.state.borrow().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.borrow().calls.len()
    }

    pub fn calls_in(&self, direction: FetchDirection) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| call.direction == direction)
            .count()
    }

    pub fn pending_count(&self) -> usize {
        self.state.borrow().pending.len()
    }

    pub fn pending_in(&self, direction: FetchDirection) -> usize {
        self.state
            .borrow()
            .pending
            .iter()
            .filter(|pending| pending.call.direction == direction)
            .count()
    }

    /// The next fetch fails with `message` (queued; one failure per fetch).
    pub fn fail_next(&self, message: impl Into<String>) {
        self.state.borrow_mut().failures.push_back(message.into());
    }

    /// Resolves the oldest pending fetch in `direction` with its page.
    pub fn resolve(&self, direction: FetchDirection) -> Option<FetchCall> {
        self.settle(direction, None)
    }

    /// Fails the oldest pending fetch in `direction`.
    pub fn reject(&self, direction: FetchDirection, message: impl Into<String>) -> Option<FetchCall> {
        self.settle(direction, Some(message.into()))
    }

    pub fn resolve_all(&self) -> usize {
        let mut resolved = 0;
        loop {
            let next = self.state.borrow().pending.front().map(|pending| pending.call.direction);
            match next.and_then(|direction| self.resolve(direction)) {
                Some(_) => resolved += 1,
                None => return resolved,
            }
        }
    }

    fn settle(&self, direction: FetchDirection, failure: Option<String>) -> Option<FetchCall> {
        let (pending, feed) = {
            let mut state = self.state.borrow_mut();
            let position = state
                .pending
                .iter()
                .position(|pending| pending.call.direction == direction)?;
            (state.pending.remove(position)?, state.feed)
        };
        let result = match failure {
            Some(message) => Err(ScriptedError(message)),
            None => Ok(feed.page(pending.call.cursor.unwrap_or(0))),
        };
        let waker = {
            let mut slot = pending.slot.borrow_mut();
            slot.result = Some(result);
            slot.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
        Some(pending.call)
    }
}

impl PageSource for ScriptedPageSource {
    type Item = i64;
    type Cursor = i64;
    type Error = ScriptedError;

    fn fetch_page(
        &self,
        direction: FetchDirection,
        cursor: Option<&i64>,
    ) -> PageFuture<i64, i64, ScriptedError> {
        let call = FetchCall {
            direction,
            cursor: cursor.copied(),
        };
        let mut state = self.state.borrow_mut();
        state.calls.push(call);
        log::trace!("scripted fetch {call:?}");

        if state.deferred {
            let slot = Rc::new(RefCell::new(Slot::default()));
            if let Some(message) = state.failures.pop_front() {
                slot.borrow_mut().result = Some(Err(ScriptedError(message)));
            } else {
                state.pending.push_back(PendingFetch {
                    call,
                    slot: Rc::clone(&slot),
                });
            }
            return Box::pin(DeferredPage { slot });
        }

        let result = match state.failures.pop_front() {
            Some(message) => Err(ScriptedError(message)),
            None => Ok(state.feed.page(call.cursor.unwrap_or(0))),
        };
        Box::pin(std::future::ready(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_feed_is_bounded() {
        let feed = NumberFeed::default();
        let first = feed.page(0);
        assert_eq!(first.items, (0..10).collect::<Vec<_>>());
        assert_eq!(first.next_cursor, Some(1));
        assert_eq!(first.prev_cursor, Some(-1));

        assert_eq!(feed.page(4).next_cursor, None);
        assert_eq!(feed.page(-4).prev_cursor, None);
    }

    #[test]
    fn deferred_fetches_wait_for_resolution() {
        let source = ScriptedPageSource::new(NumberFeed::default()).deferred();
        let _forward = source.fetch_page(FetchDirection::Forward, Some(&1));
        let _backward = source.fetch_page(FetchDirection::Backward, Some(&-1));
        assert_eq!(source.pending_count(), 2);
        assert_eq!(source.pending_in(FetchDirection::Backward), 1);

        let call = source.resolve(FetchDirection::Backward).expect("pending backward");
        assert_eq!(call.cursor, Some(-1));
        assert_eq!(source.pending_count(), 1);
        assert!(source.resolve(FetchDirection::Backward).is_none());
        assert_eq!(source.calls_in(FetchDirection::Forward), 1);
    }
}
