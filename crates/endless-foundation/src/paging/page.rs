/// One fetch result: items plus the cursors bounding it.
///
/// `None` cursors are terminal: there is no further page in that direction.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T, C> {
    pub items: Vec<T>,
    pub next_cursor: Option<C>,
    pub prev_cursor: Option<C>,
}

impl<T, C> Page<T, C> {
    pub fn new(items: Vec<T>, next_cursor: Option<C>, prev_cursor: Option<C>) -> Self {
        Self {
            items,
            next_cursor,
            prev_cursor,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A page as retained by the [`PageStore`](super::PageStore): immutable, and
/// tagged with the cursor it was fetched with.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredPage<T, C> {
    page: Page<T, C>,
    param: Option<C>,
}

impl<T, C> StoredPage<T, C> {
    pub(crate) fn new(page: Page<T, C>, param: Option<C>) -> Self {
        Self { page, param }
    }

    pub fn page(&self) -> &Page<T, C> {
        &self.page
    }

    pub fn items(&self) -> &[T] {
        &self.page.items
    }

    /// Cursor this page was fetched with. `None` for an initial fetch without cursor.
    pub fn param(&self) -> Option<&C> {
        self.param.as_ref()
    }

    pub fn into_page(self) -> Page<T, C> {
        self.page
    }
}
