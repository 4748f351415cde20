//! A virtualization engine with uniform rows.

use std::ops::RangeInclusive;

use endless_foundation::paging::{ScrollAlign, VirtualizationEngine};

/// Virtualizer over rows of one fixed height. Scroll requests apply immediately,
/// so the rendered range is current as soon as they return.
#[derive(Clone, Debug)]
pub struct FixedSizeVirtualizer {
    row_height: f32,
    viewport_height: f32,
    scroll_offset: f32,
    count: usize,
    overscan: usize,
    scroll_requests: Vec<(usize, ScrollAlign)>,
}

impl FixedSizeVirtualizer {
    pub fn new(row_height: f32, viewport_height: f32) -> Self {
        Self {
            row_height,
            viewport_height,
            scroll_offset: 0.0,
            count: 0,
            overscan: 0,
            scroll_requests: Vec::new(),
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn overscan(&self) -> usize {
        self.overscan
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    fn max_offset(&self) -> f32 {
        (self.total_size() - self.viewport_height).max(0.0)
    }

    /// User scroll.
    pub fn scroll_to_offset(&mut self, offset: f32) {
        self.scroll_offset = offset.clamp(0.0, self.max_offset());
    }

    pub fn scroll_by(&mut self, delta: f32) {
        self.scroll_to_offset(self.scroll_offset + delta);
    }

    /// `scroll_to_index` calls received from the controller, oldest first.
    pub fn scroll_requests(&self) -> &[(usize, ScrollAlign)] {
        &self.scroll_requests
    }
}

impl VirtualizationEngine for FixedSizeVirtualizer {
    fn set_count(&mut self, count: usize, overscan: usize) {
        self.count = count;
        self.overscan = overscan;
        self.scroll_offset = self.scroll_offset.clamp(0.0, self.max_offset());
    }

    fn estimate_size(&self, _index: usize) -> f32 {
        self.row_height
    }

    fn rendered_range(&self) -> Option<RangeInclusive<usize>> {
        let visible = self.visible_range()?;
        let first = visible.start().saturating_sub(self.overscan);
        let last = (visible.end() + self.overscan).min(self.count - 1);
        Some(first..=last)
    }

    fn visible_range(&self) -> Option<RangeInclusive<usize>> {
        if self.count == 0 || self.row_height <= 0.0 {
            return None;
        }
        let first = (self.scroll_offset / self.row_height).floor() as usize;
        let end = ((self.scroll_offset + self.viewport_height) / self.row_height).ceil() as usize;
        let last = end.saturating_sub(1).min(self.count - 1);
        Some(first.min(last)..=last)
    }

    fn total_size(&self) -> f32 {
        self.count as f32 * self.row_height
    }

    fn scroll_to_index(&mut self, index: usize, align: ScrollAlign) {
        self.scroll_requests.push((index, align));
        let start = index as f32 * self.row_height;
        let end = start + self.row_height;
        let target = match align {
            ScrollAlign::Start => start,
            ScrollAlign::End => end - self.viewport_height,
            ScrollAlign::Center => start - (self.viewport_height - self.row_height) / 2.0,
            ScrollAlign::Auto => {
                if start < self.scroll_offset {
                    start
                } else if end > self.scroll_offset + self.viewport_height {
                    end - self.viewport_height
                } else {
                    self.scroll_offset
                }
            }
        };
        self.scroll_to_offset(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_follow_offset_and_overscan() {
        let mut engine = FixedSizeVirtualizer::new(50.0, 200.0);
        assert_eq!(engine.rendered_range(), None);
        engine.set_count(20, 2);
        assert_eq!(engine.visible_range(), Some(0..=3));
        assert_eq!(engine.rendered_range(), Some(0..=5));

        engine.scroll_to_offset(500.0);
        assert_eq!(engine.visible_range(), Some(10..=13));
        assert_eq!(engine.rendered_range(), Some(8..=15));
    }

    #[test]
    fn scroll_to_index_aligns() {
        let mut engine = FixedSizeVirtualizer::new(50.0, 200.0);
        engine.set_count(20, 0);
        engine.scroll_to_index(19, ScrollAlign::End);
        assert_eq!(engine.scroll_offset(), 800.0);
        engine.scroll_to_index(4, ScrollAlign::Start);
        assert_eq!(engine.scroll_offset(), 200.0);
        engine.scroll_to_index(5, ScrollAlign::Auto);
        assert_eq!(engine.scroll_offset(), 200.0);
        assert_eq!(engine.scroll_requests().len(), 3);
    }
}
