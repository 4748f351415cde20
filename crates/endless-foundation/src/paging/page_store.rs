//! Ordered window of fetched pages.
//!
//! Index 0 is the backward-most retained page. The window is contiguous in
//! cursor space: when the cap forces an eviction, the cursor on that side is
//! moved to the evicted page's boundary so the page can be fetched again.

use std::collections::VecDeque;
use std::ops::Range;

use super::direction::FetchDirection;
use super::error::InvariantViolation;
use super::page::{Page, StoredPage};

/// Decides whether a commit must evict, given the number of retained pages.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EvictionPolicy {
    max_pages: Option<usize>,
}

impl EvictionPolicy {
    pub fn unbounded() -> Self {
        Self { max_pages: None }
    }

    pub fn capped(max_pages: usize) -> Self {
        debug_assert!(max_pages > 0, "page window must hold at least one page");
        Self {
            max_pages: Some(max_pages.max(1)),
        }
    }

    pub fn max_pages(&self) -> Option<usize> {
        self.max_pages
    }

    /// Whether inserting one page into a window of `retained` pages must evict one.
    pub fn evicts_after_insert(&self, retained: usize) -> bool {
        matches!(self.max_pages, Some(max) if retained + 1 > max)
    }
}

/// Exclusive owner of the retained pages and the two edge cursors.
#[derive(Debug)]
pub struct PageStore<T, C> {
    pages: VecDeque<StoredPage<T, C>>,
    forward_cursor: Option<C>,
    backward_cursor: Option<C>,
    policy: EvictionPolicy,
    item_count: usize,
}

impl<T, C> Default for PageStore<T, C> {
    fn default() -> Self {
        Self::new(EvictionPolicy::unbounded())
    }
}

impl<T, C> PageStore<T, C> {
    pub fn new(policy: EvictionPolicy) -> Self {
        Self {
            pages: VecDeque::new(),
            forward_cursor: None,
            backward_cursor: None,
            policy,
            item_count: 0,
        }
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total number of items across retained pages.
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn current_forward_cursor(&self) -> Option<&C> {
        self.forward_cursor.as_ref()
    }

    pub fn current_backward_cursor(&self) -> Option<&C> {
        self.backward_cursor.as_ref()
    }

    pub fn cursor(&self, direction: FetchDirection) -> Option<&C> {
        match direction {
            FetchDirection::Forward => self.current_forward_cursor(),
            FetchDirection::Backward => self.current_backward_cursor(),
        }
    }

    /// A seeded store with no cursor in `direction` has reached that end of the data.
    pub fn is_terminal(&self, direction: FetchDirection) -> bool {
        !self.is_empty() && self.cursor(direction).is_none()
    }

    pub fn pages(&self) -> impl Iterator<Item = &StoredPage<T, C>> + '_ {
        self.pages.iter()
    }

    pub fn page(&self, index: usize) -> Option<&StoredPage<T, C>> {
        self.pages.get(index)
    }

    /// Cursor each retained page was fetched with, backward-most first.
    pub fn page_params(&self) -> Vec<Option<&C>> {
        self.pages.iter().map(StoredPage::param).collect()
    }

    /// Flattened items in data order.
    pub fn items(&self) -> impl DoubleEndedIterator<Item = &T> + '_ {
        self.pages.iter().flat_map(|page| page.items().iter())
    }

    /// Item at flattened data index `index`.
    pub fn item(&self, mut index: usize) -> Option<&T> {
        for page in &self.pages {
            let len = page.items().len();
            if index < len {
                return page.items().get(index);
            }
            index -= len;
        }
        None
    }

    /// Flattened index range covered by page `index`.
    pub fn page_item_range(&self, index: usize) -> Option<Range<usize>> {
        let page = self.pages.get(index)?;
        let start: usize = self.pages.iter().take(index).map(|p| p.items().len()).sum();
        Some(start..start + page.items().len())
    }

    /// Items a commit growing in `direction` would evict from the opposite end.
    pub fn eviction_preview(&self, direction: FetchDirection) -> Option<usize> {
        if !self.policy.evicts_after_insert(self.pages.len()) {
            return None;
        }
        let victim = match direction {
            FetchDirection::Forward => self.pages.front(),
            FetchDirection::Backward => self.pages.back(),
        };
        victim.map(|page| page.items().len())
    }

    pub fn clear(&mut self) {
        self.pages.clear();
        self.forward_cursor = None;
        self.backward_cursor = None;
        self.item_count = 0;
    }
}

impl<T, C: Clone> PageStore<T, C> {
    /// Replaces the window with a single initial page fetched with `param`.
    pub fn seed(&mut self, page: Page<T, C>, param: Option<C>) {
        self.clear();
        self.forward_cursor = page.next_cursor.clone();
        self.backward_cursor = page.prev_cursor.clone();
        self.item_count = page.len();
        self.pages.push_back(StoredPage::new(page, param));
    }

    /// Pushes `page` to the forward end, evicting the backward-most page when
    /// the window is full. Returns the evicted page.
    pub fn append_page(
        &mut self,
        page: Page<T, C>,
    ) -> Result<Option<StoredPage<T, C>>, InvariantViolation> {
        if self.is_empty() {
            return Err(InvariantViolation::StoreNotSeeded);
        }
        let Some(param) = self.forward_cursor.take() else {
            return Err(InvariantViolation::AppendWhileTerminal);
        };
        let evict = self.policy.evicts_after_insert(self.pages.len());
        self.forward_cursor = page.next_cursor.clone();
        self.item_count += page.len();
        self.pages.push_back(StoredPage::new(page, Some(param)));

        if !evict {
            return Ok(None);
        }
        let evicted = self.pages.pop_front();
        if let Some(evicted) = &evicted {
            self.item_count -= evicted.items().len();
            self.backward_cursor = evicted
                .param()
                .cloned()
                .or_else(|| self.pages.front().and_then(|p| p.page().prev_cursor.clone()));
            log::debug!(
                "page window full, evicted backward page ({} items), {} retained",
                evicted.items().len(),
                self.pages.len()
            );
        }
        Ok(evicted)
    }

    /// Pushes `page` to the backward end, evicting the forward-most page when
    /// the window is full. Returns the evicted page.
    pub fn prepend_page(
        &mut self,
        page: Page<T, C>,
    ) -> Result<Option<StoredPage<T, C>>, InvariantViolation> {
        if self.is_empty() {
            return Err(InvariantViolation::StoreNotSeeded);
        }
        let Some(param) = self.backward_cursor.take() else {
            return Err(InvariantViolation::PrependWhileTerminal);
        };
        let evict = self.policy.evicts_after_insert(self.pages.len());
        self.backward_cursor = page.prev_cursor.clone();
        self.item_count += page.len();
        self.pages.push_front(StoredPage::new(page, Some(param)));

        if !evict {
            return Ok(None);
        }
        let evicted = self.pages.pop_back();
        if let Some(evicted) = &evicted {
            self.item_count -= evicted.items().len();
            self.forward_cursor = evicted
                .param()
                .cloned()
                .or_else(|| self.pages.back().and_then(|p| p.page().next_cursor.clone()));
            log::debug!(
                "page window full, evicted forward page ({} items), {} retained",
                evicted.items().len(),
                self.pages.len()
            );
        }
        Ok(evicted)
    }

    pub fn insert(
        &mut self,
        direction: FetchDirection,
        page: Page<T, C>,
    ) -> Result<Option<StoredPage<T, C>>, InvariantViolation> {
        match direction {
            FetchDirection::Forward => self.append_page(page),
            FetchDirection::Backward => self.prepend_page(page),
        }
    }
}
