//! Index-based edge detection for virtualized lists.
//!
//! A virtualized list cannot host real sentinels because off-screen rows do not
//! exist. Instead the row space gets a synthetic loader row on every loadable
//! edge, and reaching one of them in the rendered range stands in for a
//! sentinel intersection.

use std::ops::RangeInclusive;

use smallvec::SmallVec;

use super::direction::{Edge, ListShape};
use super::viewport::ScrollAlign;

/// The virtualization engine the list is rendered through.
pub trait VirtualizationEngine {
    /// Row count (items plus loader rows) and overscan margin.
    fn set_count(&mut self, count: usize, overscan: usize);

    fn estimate_size(&self, index: usize) -> f32;

    /// Rows currently rendered, overscan included. `None` before the first layout.
    fn rendered_range(&self) -> Option<RangeInclusive<usize>>;

    /// Rows actually inside the viewport. Engines that do not track it separately
    /// report the rendered range.
    fn visible_range(&self) -> Option<RangeInclusive<usize>> {
        self.rendered_range()
    }

    fn total_size(&self) -> f32;

    fn scroll_to_index(&mut self, index: usize, align: ScrollAlign);
}

/// What a host row shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowKind {
    TopLoader,
    /// Item at this display index.
    Item(usize),
    BottomLoader,
}

#[derive(Clone, Debug)]
pub struct VirtualizationAdapter {
    shape: ListShape,
    item_count: usize,
    // Edges held back until the rendered range leaves them, indexed top then bottom.
    latched: [bool; 2],
}

fn edge_slot(edge: Edge) -> usize {
    match edge {
        Edge::Top => 0,
        Edge::Bottom => 1,
    }
}

impl VirtualizationAdapter {
    pub fn new(shape: ListShape) -> Self {
        Self {
            shape,
            item_count: 0,
            latched: [false, false],
        }
    }

    pub fn set_item_count(&mut self, item_count: usize) {
        self.item_count = item_count;
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Synthetic rows before the first item.
    pub fn top_rows(&self) -> usize {
        usize::from(self.shape.has_top_loader())
    }

    fn bottom_rows(&self) -> usize {
        usize::from(self.shape.has_bottom_loader())
    }

    pub fn row_count(&self) -> usize {
        self.top_rows() + self.item_count + self.bottom_rows()
    }

    pub fn row_kind(&self, row: usize) -> Option<RowKind> {
        let top = self.top_rows();
        if row >= self.row_count() {
            return None;
        }
        if row < top {
            return Some(RowKind::TopLoader);
        }
        if row - top < self.item_count {
            return Some(RowKind::Item(row - top));
        }
        Some(RowKind::BottomLoader)
    }

    pub fn row_for_item(&self, index: usize) -> usize {
        self.top_rows() + index
    }

    /// Row whose rendering signals the bottom edge: the last data row, or the
    /// bottom loader while there are no items.
    fn bottom_trigger_row(&self) -> usize {
        self.top_rows() + self.item_count.saturating_sub(1)
    }

    /// Pushes the row count and overscan to the engine.
    pub fn sync(&self, engine: &mut dyn VirtualizationEngine, overscan: usize) {
        engine.set_count(self.row_count(), overscan);
    }

    /// Stops reporting `edge` until the rendered range has left it once, the way
    /// a sentinel only fires again after scrolling out and back in.
    pub fn latch(&mut self, edge: Edge) {
        self.latched[edge_slot(edge)] = true;
    }

    pub fn unlatch(&mut self, edge: Edge) {
        self.latched[edge_slot(edge)] = false;
    }

    pub fn unlatch_all(&mut self) {
        self.latched = [false, false];
    }

    pub fn is_latched(&self, edge: Edge) -> bool {
        self.latched[edge_slot(edge)]
    }

    /// Edges reached by `range`. Level-triggered: call on every recalculation,
    /// since scrolling alone moves the range. A latched edge is skipped while
    /// reached and released as soon as the range no longer reaches it.
    pub fn edge_events(&mut self, range: &RangeInclusive<usize>) -> SmallVec<[Edge; 2]> {
        let mut edges = SmallVec::new();
        let reached = [
            self.shape.has_top_loader() && *range.start() == 0,
            self.shape.has_bottom_loader() && *range.end() >= self.bottom_trigger_row(),
        ];
        for (edge, reached) in [Edge::Top, Edge::Bottom].into_iter().zip(reached) {
            let slot = edge_slot(edge);
            if !reached {
                self.latched[slot] = false;
            } else if self.latched[slot] {
                log::trace!("rendered rows {range:?} reach latched {edge} edge");
            } else {
                edges.push(edge);
            }
        }
        if !edges.is_empty() {
            log::trace!("rendered rows {range:?} reach {edges:?}");
        }
        edges
    }

    /// First data item inside `range`, as a display index.
    pub fn first_item_in(&self, range: &RangeInclusive<usize>) -> Option<usize> {
        let top = self.top_rows();
        let first = (*range.start()).max(top);
        (first <= *range.end() && first - top < self.item_count).then(|| first - top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bidirectional_rows_have_two_loaders() {
        let mut adapter = VirtualizationAdapter::new(ListShape::Bidirectional);
        adapter.set_item_count(10);
        assert_eq!(adapter.row_count(), 12);
        assert_eq!(adapter.row_kind(0), Some(RowKind::TopLoader));
        assert_eq!(adapter.row_kind(1), Some(RowKind::Item(0)));
        assert_eq!(adapter.row_kind(10), Some(RowKind::Item(9)));
        assert_eq!(adapter.row_kind(11), Some(RowKind::BottomLoader));
        assert_eq!(adapter.row_kind(12), None);
    }

    #[test]
    fn edges_follow_rendered_range() {
        let mut adapter = VirtualizationAdapter::new(ListShape::Bidirectional);
        adapter.set_item_count(10);
        assert_eq!(adapter.edge_events(&(0..=4)).as_slice(), &[Edge::Top]);
        assert!(adapter.edge_events(&(3..=7)).is_empty());
        // Last rendered row reaches item_count: the last data row is on screen.
        assert_eq!(adapter.edge_events(&(6..=10)).as_slice(), &[Edge::Bottom]);
        assert_eq!(
            adapter.edge_events(&(0..=11)).as_slice(),
            &[Edge::Top, Edge::Bottom]
        );
    }

    #[test]
    fn single_ended_shapes_have_one_loader() {
        let mut forward = VirtualizationAdapter::new(ListShape::Forward);
        forward.set_item_count(5);
        assert_eq!(forward.row_count(), 6);
        assert_eq!(forward.row_kind(0), Some(RowKind::Item(0)));
        assert_eq!(forward.edge_events(&(0..=3)).as_slice(), &[] as &[Edge]);
        assert_eq!(forward.edge_events(&(1..=4)).as_slice(), &[Edge::Bottom]);

        let mut reverse = VirtualizationAdapter::new(ListShape::Reverse);
        reverse.set_item_count(5);
        assert_eq!(reverse.row_for_item(0), 1);
        assert_eq!(reverse.edge_events(&(0..=5)).as_slice(), &[Edge::Top]);
    }

    #[test]
    fn latched_edge_waits_for_the_range_to_leave() {
        let mut adapter = VirtualizationAdapter::new(ListShape::Bidirectional);
        adapter.set_item_count(10);
        adapter.latch(Edge::Bottom);
        assert!(adapter.edge_events(&(6..=11)).is_empty());
        assert!(adapter.edge_events(&(7..=11)).is_empty());
        assert_eq!(adapter.edge_events(&(0..=11)).as_slice(), &[Edge::Top]);
        assert!(adapter.is_latched(Edge::Bottom));

        assert!(adapter.edge_events(&(4..=8)).is_empty());
        assert!(!adapter.is_latched(Edge::Bottom));
        assert_eq!(adapter.edge_events(&(6..=10)).as_slice(), &[Edge::Bottom]);

        adapter.latch(Edge::Top);
        adapter.unlatch(Edge::Top);
        assert_eq!(adapter.edge_events(&(0..=4)).as_slice(), &[Edge::Top]);
    }

    #[test]
    fn first_item_skips_loader_rows() {
        let mut adapter = VirtualizationAdapter::new(ListShape::Bidirectional);
        adapter.set_item_count(10);
        assert_eq!(adapter.first_item_in(&(0..=3)), Some(0));
        assert_eq!(adapter.first_item_in(&(4..=8)), Some(3));
        assert_eq!(adapter.first_item_in(&(11..=11)), None);
    }
}
