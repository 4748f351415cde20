//! The infinite list view.
//!
//! The view owns no pagination logic. It mounts the controller on a host,
//! forwards frames to it, and describes what to draw as [`ListRow`]s. Every
//! variant is the same view over a differently configured controller.

use std::ops::RangeInclusive;

use endless_core::RuntimeHandle;
use endless_foundation::paging::{
    ConfigError, Edge, FetchDirection, InfiniteListConfig, InfiniteListController, ListStatus,
    Page, PageSource, PagingError, RowKind, TriggerSkipped, ViewportHost, VirtualizationAdapter,
};

pub const DEFAULT_LOADING_MESSAGE: &str = "loading...";
pub const DEFAULT_ENDING_MESSAGE: &str = "end";
/// Shown in place of the list while the first page loads.
pub const PENDING_STATUS_TEXT: &str = "Loading from client...";

/// Loader row texts for one edge: `loading` while more pages exist, `ending` after.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EdgeMessages {
    pub loading: String,
    pub ending: String,
}

impl EdgeMessages {
    pub fn new(loading: impl Into<String>, ending: impl Into<String>) -> Self {
        Self {
            loading: loading.into(),
            ending: ending.into(),
        }
    }
}

impl Default for EdgeMessages {
    fn default() -> Self {
        Self::new(DEFAULT_LOADING_MESSAGE, DEFAULT_ENDING_MESSAGE)
    }
}

/// One drawable row.
#[derive(Clone, Debug, PartialEq)]
pub enum ListRow<T> {
    /// Replaces the whole list before the first page (pending or failed).
    Status(String),
    /// Loader row at a loading edge. Plain hosts put the sentinel here.
    Loader { edge: Edge, text: String },
    Item { index: usize, item: T },
}

impl<T> ListRow<T> {
    pub fn is_loader(&self) -> bool {
        matches!(self, ListRow::Loader { .. })
    }

    pub fn item(&self) -> Option<&T> {
        match self {
            ListRow::Item { item, .. } => Some(item),
            _ => None,
        }
    }
}

/// An infinitely scrolling list over a [`PageSource`].
pub struct InfiniteList<S: PageSource> {
    controller: InfiniteListController<S>,
    messages: [EdgeMessages; 2],
    mounted: bool,
}

fn edge_slot(edge: Edge) -> usize {
    match edge {
        Edge::Top => 0,
        Edge::Bottom => 1,
    }
}

impl<S: PageSource> InfiniteList<S> {
    pub fn new(
        source: S,
        config: InfiniteListConfig<S::Cursor>,
        runtime: RuntimeHandle,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            controller: InfiniteListController::new(source, config, runtime)?,
            messages: [EdgeMessages::default(), EdgeMessages::default()],
            mounted: false,
        })
    }

    /// Loads downwards only.
    pub fn forward(source: S, runtime: RuntimeHandle) -> Result<Self, ConfigError> {
        Self::new(source, InfiniteListConfig::forward(), runtime)
    }

    /// Newest at the bottom, older pages load above.
    pub fn reverse(source: S, runtime: RuntimeHandle) -> Result<Self, ConfigError> {
        Self::new(source, InfiniteListConfig::reverse(), runtime)
    }

    pub fn bidirectional(source: S, runtime: RuntimeHandle) -> Result<Self, ConfigError> {
        Self::new(source, InfiniteListConfig::bidirectional(), runtime)
    }

    pub fn virtual_forward(
        source: S,
        runtime: RuntimeHandle,
        overscan: usize,
    ) -> Result<Self, ConfigError> {
        let config = InfiniteListConfig::forward()
            .virtualized()
            .with_overscan(overscan);
        Ok(Self::new(source, config, runtime)?
            .with_edge_messages(Edge::Bottom, EdgeMessages::new("Loading more...", "Nothing more to load")))
    }

    pub fn virtual_bidirectional(
        source: S,
        runtime: RuntimeHandle,
        overscan: usize,
    ) -> Result<Self, ConfigError> {
        let config = InfiniteListConfig::bidirectional()
            .virtualized()
            .with_overscan(overscan);
        Ok(Self::new(source, config, runtime)?
            .with_edge_messages(
                Edge::Top,
                EdgeMessages::new("Loading previous page...", "No more previous page"),
            )
            .with_edge_messages(
                Edge::Bottom,
                EdgeMessages::new("Loading next page...", "No more next page"),
            ))
    }

    /// Same loader texts on both edges.
    pub fn with_messages(mut self, loading: impl Into<String>, ending: impl Into<String>) -> Self {
        let messages = EdgeMessages::new(loading, ending);
        self.messages = [messages.clone(), messages];
        self
    }

    pub fn with_edge_messages(mut self, edge: Edge, messages: EdgeMessages) -> Self {
        self.set_edge_messages(edge, messages);
        self
    }

    pub fn set_edge_messages(&mut self, edge: Edge, messages: EdgeMessages) {
        self.messages[edge_slot(edge)] = messages;
    }

    pub fn controller(&self) -> &InfiniteListController<S> {
        &self.controller
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Attaches the host and starts the first fetch if none happened yet.
    pub fn mount(&mut self, host: ViewportHost) -> Result<(), PagingError> {
        self.controller.attach(host)?;
        self.mounted = true;
        if self.controller.status() == ListStatus::Pending {
            if let Err(reason) = self.controller.load_initial() {
                log::debug!("initial load not started: {reason}");
            }
        }
        Ok(())
    }

    /// Attaches the host and shows a page fetched ahead of time.
    pub fn mount_hydrated(
        &mut self,
        host: ViewportHost,
        page: Page<S::Item, S::Cursor>,
    ) -> Result<(), PagingError> {
        self.controller.attach(host)?;
        self.mounted = true;
        if let Err(reason) = self.controller.hydrate(page) {
            log::debug!("hydration skipped: {reason}");
        }
        Ok(())
    }

    pub fn unmount(&mut self) {
        if self.mounted {
            self.controller.dispose();
            self.mounted = false;
        }
    }

    /// Call once per frame after the host laid out the rows.
    pub fn frame(&self) {
        self.controller.frame();
    }

    /// Manual "load more" for the given edge, gated like the sentinels.
    pub fn load_more(&self, edge: Edge) -> Result<(), TriggerSkipped> {
        let direction = self
            .controller
            .shape()
            .direction_for(edge)
            .ok_or(TriggerSkipped::DirectionDisabled)?;
        self.controller.trigger(direction)
    }

    pub fn status_text(&self) -> Option<String> {
        match self.controller.status() {
            ListStatus::Pending | ListStatus::Loading => Some(PENDING_STATUS_TEXT.to_string()),
            ListStatus::Error(message) => Some(format!("Error {message}")),
            ListStatus::Ready => None,
        }
    }

    /// Loader text for `edge`, or `None` when the list does not load there.
    pub fn loader_text(&self, edge: Edge) -> Option<&str> {
        let direction = self.controller.shape().direction_for(edge)?;
        let more = match direction {
            FetchDirection::Forward => self.controller.has_next(),
            FetchDirection::Backward => self.controller.has_previous(),
        };
        let messages = &self.messages[edge_slot(edge)];
        Some(if more {
            messages.loading.as_str()
        } else {
            messages.ending.as_str()
        })
    }

    fn loader_row(&self, edge: Edge) -> Option<ListRow<S::Item>> {
        self.loader_text(edge).map(|text| ListRow::Loader {
            edge,
            text: text.to_string(),
        })
    }

    fn row_layout(&self) -> VirtualizationAdapter {
        let mut adapter = VirtualizationAdapter::new(self.controller.shape());
        adapter.set_item_count(self.controller.item_count());
        adapter
    }

    /// Host row count, loader rows included. Same row space the virtualization
    /// engine is sized with.
    pub fn row_count(&self) -> usize {
        if self.status_text().is_some() {
            return 1;
        }
        self.row_layout().row_count()
    }

    pub fn row(&self, row: usize) -> Option<ListRow<S::Item>>
    where
        S::Item: Clone,
    {
        if let Some(text) = self.status_text() {
            return (row == 0).then_some(ListRow::Status(text));
        }
        match self.row_layout().row_kind(row)? {
            RowKind::TopLoader => self.loader_row(Edge::Top),
            RowKind::BottomLoader => self.loader_row(Edge::Bottom),
            RowKind::Item(index) => self
                .controller
                .item(index)
                .map(|item| ListRow::Item { index, item }),
        }
    }

    /// Rows a virtualization engine asked for.
    pub fn rows_in(&self, range: RangeInclusive<usize>) -> Vec<ListRow<S::Item>>
    where
        S::Item: Clone,
    {
        range.filter_map(|row| self.row(row)).collect()
    }

    /// Every row, for plain (non-virtualized) hosts.
    pub fn rows(&self) -> Vec<ListRow<S::Item>>
    where
        S::Item: Clone,
    {
        if let Some(text) = self.status_text() {
            return vec![ListRow::Status(text)];
        }
        let mut rows = Vec::with_capacity(self.controller.item_count() + 2);
        rows.extend(self.loader_row(Edge::Top));
        self.controller.visit_items(|index, item| {
            rows.push(ListRow::Item {
                index,
                item: item.clone(),
            })
        });
        rows.extend(self.loader_row(Edge::Bottom));
        rows
    }
}

impl<S: PageSource> Drop for InfiniteList<S> {
    fn drop(&mut self) {
        self.unmount();
    }
}
