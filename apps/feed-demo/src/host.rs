//! Headless hosts for the demo: every row has a fixed height and nothing is drawn.

use std::ops::RangeInclusive;

use endless_foundation::paging::{
    Edge, ScrollAlign, ScrollViewport, ViewportMetrics, VirtualizationEngine,
};
use endless_ui::ListRow;

/// Scroll container laid out from the list's rows. Keeps `scroll_top` across
/// layouts, so only the controller's writes keep content in place.
#[derive(Debug)]
pub struct FeedViewport {
    client_height: f32,
    row_height: f32,
    loader_height: f32,
    scroll_top: f32,
    leading: f32,
    items: usize,
    trailing: f32,
}

impl FeedViewport {
    pub fn new(client_height: f32, row_height: f32, loader_height: f32) -> Self {
        Self {
            client_height,
            row_height,
            loader_height,
            scroll_top: 0.0,
            leading: 0.0,
            items: 0,
            trailing: 0.0,
        }
    }

    pub fn layout<T>(&mut self, rows: &[ListRow<T>]) {
        self.leading = 0.0;
        self.trailing = 0.0;
        self.items = 0;
        for row in rows {
            match row {
                ListRow::Status(_) | ListRow::Loader { edge: Edge::Top, .. } => {
                    self.leading += self.loader_height
                }
                ListRow::Loader { edge: Edge::Bottom, .. } => self.trailing += self.loader_height,
                ListRow::Item { .. } => self.items += 1,
            }
        }
        self.scroll_top = self.clamp(self.scroll_top);
    }

    pub fn scroll_top(&self) -> f32 {
        self.scroll_top
    }

    /// User scroll.
    pub fn scroll_to(&mut self, offset: f32) {
        self.scroll_top = self.clamp(offset);
    }

    fn scroll_height(&self) -> f32 {
        self.leading + self.items as f32 * self.row_height + self.trailing
    }

    fn clamp(&self, offset: f32) -> f32 {
        offset.clamp(0.0, (self.scroll_height() - self.client_height).max(0.0))
    }
}

impl ScrollViewport for FeedViewport {
    fn metrics(&self) -> ViewportMetrics {
        ViewportMetrics::new(self.scroll_top, self.scroll_height(), self.client_height)
    }

    fn set_scroll_top(&mut self, scroll_top: f32) {
        self.scroll_top = self.clamp(scroll_top);
    }

    fn item_offset(&self, index: usize) -> Option<f32> {
        (index < self.items).then(|| self.leading + index as f32 * self.row_height)
    }
}

/// Virtualization engine over rows of one height.
#[derive(Debug)]
pub struct FeedVirtualizer {
    row_height: f32,
    viewport_height: f32,
    offset: f32,
    count: usize,
    overscan: usize,
}

impl FeedVirtualizer {
    pub fn new(row_height: f32, viewport_height: f32) -> Self {
        Self {
            row_height,
            viewport_height,
            offset: 0.0,
            count: 0,
            overscan: 0,
        }
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// User scroll.
    pub fn scroll_to(&mut self, offset: f32) {
        let max = (self.total_size() - self.viewport_height).max(0.0);
        self.offset = offset.clamp(0.0, max);
    }
}

impl VirtualizationEngine for FeedVirtualizer {
    fn set_count(&mut self, count: usize, overscan: usize) {
        self.count = count;
        self.overscan = overscan;
        self.scroll_to(self.offset);
    }

    fn estimate_size(&self, _index: usize) -> f32 {
        self.row_height
    }

    fn rendered_range(&self) -> Option<RangeInclusive<usize>> {
        let visible = self.visible_range()?;
        let first = visible.start().saturating_sub(self.overscan);
        let last = (*visible.end() + self.overscan).min(self.count - 1);
        Some(first..=last)
    }

    fn visible_range(&self) -> Option<RangeInclusive<usize>> {
        if self.count == 0 {
            return None;
        }
        let last_row = self.count - 1;
        let first = ((self.offset / self.row_height) as usize).min(last_row);
        let end = ((self.offset + self.viewport_height) / self.row_height).ceil() as usize;
        Some(first..=end.saturating_sub(1).clamp(first, last_row))
    }

    fn total_size(&self) -> f32 {
        self.count as f32 * self.row_height
    }

    fn scroll_to_index(&mut self, index: usize, align: ScrollAlign) {
        let start = index as f32 * self.row_height;
        let target = match align {
            ScrollAlign::Start => start,
            ScrollAlign::End => start + self.row_height - self.viewport_height,
            ScrollAlign::Center => start - (self.viewport_height - self.row_height) / 2.0,
            ScrollAlign::Auto if start < self.offset => start,
            ScrollAlign::Auto => (start + self.row_height - self.viewport_height).max(self.offset),
        };
        self.scroll_to(target);
    }
}
