//! A scroll container without a renderer.

use endless_foundation::paging::{ScrollViewport, ViewportMetrics};

/// Scroll viewport whose content is laid out explicitly by the test.
///
/// Like a browser without native scroll anchoring: `layout` changes the content
/// height but keeps `scroll_top` (clamped), so any jump the controller fails to
/// compensate shows up in assertions.
#[derive(Clone, Debug)]
pub struct HeadlessViewport {
    client_height: f32,
    scroll_top: f32,
    leading: f32,
    trailing: f32,
    // offsets[i] is the top of item i relative to the first item; last entry is the total.
    offsets: Vec<f32>,
    writes: Vec<f32>,
}

impl HeadlessViewport {
    pub fn new(client_height: f32) -> Self {
        Self {
            client_height,
            scroll_top: 0.0,
            leading: 0.0,
            trailing: 0.0,
            offsets: vec![0.0],
            writes: Vec::new(),
        }
    }

    /// Replaces the content: `leading` pixels above the first item, one entry per
    /// item in display order, `trailing` pixels below the last.
    pub fn layout(&mut self, leading: f32, item_heights: impl IntoIterator<Item = f32>, trailing: f32) {
        self.leading = leading;
        self.trailing = trailing;
        self.offsets.clear();
        self.offsets.push(0.0);
        let mut total = 0.0;
        for height in item_heights {
            total += height;
            self.offsets.push(total);
        }
        self.scroll_top = self.scroll_top.clamp(0.0, self.max_scroll_top());
    }

    pub fn layout_uniform(&mut self, count: usize, row_height: f32) {
        self.layout(0.0, std::iter::repeat(row_height).take(count), 0.0);
    }

    pub fn item_count(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn scroll_top(&self) -> f32 {
        self.scroll_top
    }

    pub fn scroll_height(&self) -> f32 {
        self.leading + self.offsets.last().copied().unwrap_or(0.0) + self.trailing
    }

    pub fn client_height(&self) -> f32 {
        self.client_height
    }

    pub fn set_client_height(&mut self, client_height: f32) {
        self.client_height = client_height;
    }

    pub fn max_scroll_top(&self) -> f32 {
        (self.scroll_height() - self.client_height).max(0.0)
    }

    /// User scroll. Not recorded as a controller write.
    pub fn scroll_to(&mut self, offset: f32) {
        self.scroll_top = offset.clamp(0.0, self.max_scroll_top());
    }

    pub fn scroll_by(&mut self, delta: f32) {
        self.scroll_to(self.scroll_top + delta);
    }

    /// Offsets written by the controller, oldest first.
    pub fn writes(&self) -> &[f32] {
        &self.writes
    }

    /// Display indices of items that intersect the viewport.
    pub fn visible_items(&self) -> std::ops::Range<usize> {
        let top = self.scroll_top - self.leading;
        let bottom = top + self.client_height;
        let count = self.item_count();
        let first = (0..count)
            .find(|&i| self.offsets[i + 1] > top)
            .unwrap_or(count);
        let end = (first..count)
            .find(|&i| self.offsets[i] >= bottom)
            .unwrap_or(count);
        first..end
    }
}

impl ScrollViewport for HeadlessViewport {
    fn metrics(&self) -> ViewportMetrics {
        ViewportMetrics::new(self.scroll_top, self.scroll_height(), self.client_height)
    }

    fn set_scroll_top(&mut self, scroll_top: f32) {
        self.writes.push(scroll_top);
        self.scroll_top = scroll_top.clamp(0.0, self.max_scroll_top());
    }

    fn item_offset(&self, index: usize) -> Option<f32> {
        (index < self.item_count()).then(|| self.leading + self.offsets[index])
    }
}
