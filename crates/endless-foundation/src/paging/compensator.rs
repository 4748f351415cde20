//! Scroll anchoring across page commits.
//!
//! Content that lands above the viewport, or disappears from above it, would
//! move everything the user is looking at. The compensator records where the
//! user was before the page store mutates, and once the host has laid out the
//! new content it produces the one [`ScrollCommand`] that puts the same content
//! back under the same screen position.
//!
//! All commits that happen between two frames are folded into a single pending
//! compensation with one before/after pair, so an append that evicts from the
//! top is corrected once, from the combined layout.

use smallvec::SmallVec;

use super::direction::{FetchDirection, ListShape};
use super::error::InvariantViolation;
use super::viewport::{ScrollAlign, ScrollCommand, ScrollViewport, ViewportMetrics};

/// A display-order item the user is looking at, and where it sat before the mutation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ItemAnchor {
    pub index: usize,
    pub offset_before: f32,
}

/// Viewport state recorded before a mutation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportAnchor {
    pub scroll_top_before: f32,
    pub scroll_height_before: f32,
    pub item: Option<ItemAnchor>,
}

impl ViewportAnchor {
    pub fn from_metrics(metrics: ViewportMetrics) -> Self {
        Self {
            scroll_top_before: metrics.scroll_top,
            scroll_height_before: metrics.scroll_height,
            item: None,
        }
    }

    pub fn with_item(mut self, item: Option<ItemAnchor>) -> Self {
        self.item = item;
        self
    }
}

/// What a commit did to the display, in visual terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollIntent {
    /// First page committed.
    Initial,
    /// Items inserted at the visual top; `evicted_bottom` items dropped at the bottom.
    Prepended { items: usize, evicted_bottom: usize },
    /// Items inserted at the visual bottom; `evicted_top` items dropped at the top.
    Appended { items: usize, evicted_top: usize },
}

impl ScrollIntent {
    /// How far the display index of a surviving item moves.
    pub fn index_shift(&self) -> isize {
        match *self {
            ScrollIntent::Initial => 0,
            ScrollIntent::Prepended { items, .. } => items as isize,
            ScrollIntent::Appended { evicted_top, .. } => -(evicted_top as isize),
        }
    }

    /// Whether content above the anchor changed, so a scroll write is required.
    pub fn moves_anchor(&self) -> bool {
        match *self {
            ScrollIntent::Initial => false,
            ScrollIntent::Prepended { .. } => true,
            ScrollIntent::Appended { evicted_top, .. } => evicted_top > 0,
        }
    }

    fn is_pure_prepend(&self) -> bool {
        matches!(self, ScrollIntent::Prepended { evicted_bottom: 0, .. })
    }
}

#[derive(Debug)]
struct PendingCompensation {
    initial: bool,
    /// Sampled against the last laid-out frame, before the first merged commit.
    anchor: Option<ViewportAnchor>,
    shift: isize,
    moves_anchor: bool,
    pure_prepend: bool,
    appended: bool,
    directions: SmallVec<[FetchDirection; 2]>,
}

impl PendingCompensation {
    fn new(direction: FetchDirection, intent: ScrollIntent, anchor: Option<ViewportAnchor>) -> Self {
        Self {
            initial: false,
            anchor,
            shift: intent.index_shift(),
            moves_anchor: intent.moves_anchor(),
            pure_prepend: intent.is_pure_prepend(),
            appended: matches!(intent, ScrollIntent::Appended { .. }),
            directions: SmallVec::from_slice(&[direction]),
        }
    }

    fn merge(&mut self, direction: FetchDirection, intent: ScrollIntent) {
        self.shift += intent.index_shift();
        self.moves_anchor |= intent.moves_anchor();
        self.pure_prepend &= intent.is_pure_prepend();
        self.appended |= matches!(intent, ScrollIntent::Appended { .. });
        if !self.directions.contains(&direction) {
            self.directions.push(direction);
        }
    }
}

/// Result of [`ScrollAnchorCompensator::settle_dom`] / [`settle_virtual`](ScrollAnchorCompensator::settle_virtual).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Settlement {
    pub command: Option<ScrollCommand>,
    /// Directions whose `CompensationPending` hold is over.
    pub released: SmallVec<[FetchDirection; 2]>,
}

/// Sole producer of scroll writes.
#[derive(Debug)]
pub struct ScrollAnchorCompensator {
    shape: ListShape,
    virtualized: bool,
    captured: [Option<ViewportAnchor>; 2],
    pending: Option<PendingCompensation>,
}

impl ScrollAnchorCompensator {
    pub fn new(shape: ListShape, virtualized: bool) -> Self {
        Self {
            shape,
            virtualized,
            captured: [None, None],
            pending: None,
        }
    }

    pub fn is_virtualized(&self) -> bool {
        self.virtualized
    }

    /// Records the viewport at dispatch of a fetch that grows the visual top.
    pub fn capture(&mut self, direction: FetchDirection, anchor: ViewportAnchor) {
        self.captured[direction.slot()] = Some(anchor);
    }

    pub fn captured(&self, direction: FetchDirection) -> Option<&ViewportAnchor> {
        self.captured[direction.slot()].as_ref()
    }

    /// Forgets the dispatch anchor of a fetch that failed or went stale.
    pub fn discard(&mut self, direction: FetchDirection) {
        self.captured[direction.slot()] = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_directions(&self) -> &[FetchDirection] {
        self.pending
            .as_ref()
            .map(|pending| pending.directions.as_slice())
            .unwrap_or(&[])
    }

    /// Arms the initial scroll. Holds every listed direction until it is applied.
    pub fn arm_initial(&mut self, directions: impl IntoIterator<Item = FetchDirection>) {
        self.captured = [None, None];
        self.pending = Some(PendingCompensation {
            initial: true,
            anchor: None,
            shift: 0,
            moves_anchor: false,
            pure_prepend: false,
            appended: false,
            directions: directions.into_iter().collect(),
        });
    }

    /// Arms the compensation for a commit in `direction`.
    ///
    /// `live` is the anchor sampled right before the store mutated; it wins over the
    /// dispatch-time capture because commits in the other direction may have moved
    /// the content since. Only the first commit after a layout can be sampled: a
    /// commit that reaches here while another is still pending is merged, keeping
    /// the first anchor and adding up the index shifts.
    pub fn arm(
        &mut self,
        direction: FetchDirection,
        intent: ScrollIntent,
        live: Option<ViewportAnchor>,
    ) -> Result<(), InvariantViolation> {
        let captured = self.captured[direction.slot()].take();
        match &mut self.pending {
            Some(pending) => {
                if intent.moves_anchor() && !pending.initial && pending.anchor.is_none() {
                    return Err(InvariantViolation::CompensationWithoutAnchor { direction });
                }
                pending.merge(direction, intent);
                log::debug!("{direction} commit merged into pending compensation ({intent:?})");
            }
            None => {
                let anchor = live.or(captured);
                if intent.moves_anchor() && anchor.is_none() {
                    return Err(InvariantViolation::CompensationWithoutAnchor { direction });
                }
                self.pending = Some(PendingCompensation::new(direction, intent, anchor));
                log::debug!("{direction} compensation armed ({intent:?})");
            }
        }
        Ok(())
    }

    /// Resolves the pending compensation against a laid-out plain viewport.
    pub fn settle_dom(&mut self, viewport: &dyn ScrollViewport, item_count: usize) -> Settlement {
        let Some(pending) = self.pending.take() else {
            return Settlement::default();
        };
        let metrics = viewport.metrics();
        let command = if pending.initial {
            match self.shape {
                ListShape::Forward => None,
                ListShape::Reverse | ListShape::Bidirectional => {
                    Some(ScrollCommand::ToOffset(metrics.max_scroll_top()))
                }
            }
        } else if pending.moves_anchor {
            pending.anchor.and_then(|anchor| {
                anchored_offset(&pending, anchor, viewport, item_count, metrics).map(ScrollCommand::ToOffset)
            })
        } else {
            None
        };
        Settlement {
            command,
            released: pending.directions,
        }
    }

    /// Resolves the pending compensation for a virtualization engine. Rows are
    /// addressed by index: `top_rows` synthetic rows precede the first item.
    pub fn settle_virtual(&mut self, top_rows: usize, item_count: usize) -> Settlement {
        let Some(pending) = self.pending.take() else {
            return Settlement::default();
        };
        let command = if pending.initial {
            match self.shape {
                ListShape::Forward => None,
                ListShape::Reverse | ListShape::Bidirectional if item_count > 0 => {
                    Some(ScrollCommand::ToIndex {
                        index: top_rows + item_count - 1,
                        align: ScrollAlign::End,
                    })
                }
                ListShape::Reverse | ListShape::Bidirectional => None,
            }
        } else if pending.moves_anchor {
            pending.anchor.and_then(|anchor| {
                let item = anchor.item?;
                match shifted_index(item.index, pending.shift, item_count) {
                    Some(index) => Some(ScrollCommand::ToIndex {
                        index: top_rows + index,
                        align: ScrollAlign::Start,
                    }),
                    None => {
                        log::warn!("anchor row {} was evicted, scroll position not kept", item.index);
                        None
                    }
                }
            })
        } else {
            None
        };
        Settlement {
            command,
            released: pending.directions,
        }
    }

    pub fn clear(&mut self) {
        self.captured = [None, None];
        self.pending = None;
    }
}

fn shifted_index(index: usize, shift: isize, item_count: usize) -> Option<usize> {
    let shifted = index as isize + shift;
    (shifted >= 0 && (shifted as usize) < item_count).then_some(shifted as usize)
}

fn anchored_offset(
    pending: &PendingCompensation,
    anchor: ViewportAnchor,
    viewport: &dyn ScrollViewport,
    item_count: usize,
    metrics: ViewportMetrics,
) -> Option<f32> {
    let height_delta = metrics.scroll_height - anchor.scroll_height_before;
    if pending.pure_prepend {
        // Only content above the anchor changed: the height delta is exact.
        return Some(anchor.scroll_top_before + height_delta);
    }
    if let Some(item) = anchor.item {
        let offset_after = shifted_index(item.index, pending.shift, item_count)
            .and_then(|index| viewport.item_offset(index));
        if let Some(offset_after) = offset_after {
            return Some(anchor.scroll_top_before + (offset_after - item.offset_before));
        }
    }
    if pending.appended {
        // The height delta would count rows added below the viewport too.
        log::warn!("no surviving anchor item, scroll position not kept");
        return None;
    }
    log::warn!("no surviving anchor item, falling back to height delta {height_delta}");
    Some(anchor.scroll_top_before + height_delta)
}

/// First surviving item at or below `scroll_top`, located by binary search over
/// the (monotonic) item offsets in `survivors`. Indices the viewport has not laid
/// out yet count as below everything.
pub fn pick_item_anchor(
    viewport: &dyn ScrollViewport,
    survivors: std::ops::Range<usize>,
    scroll_top: f32,
) -> Option<ItemAnchor> {
    if survivors.is_empty() {
        return None;
    }
    let (mut lo, mut hi) = (survivors.start, survivors.end);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        match viewport.item_offset(mid) {
            Some(offset) if offset < scroll_top => lo = mid + 1,
            _ => hi = mid,
        }
    }
    let index = lo.min(survivors.end - 1);
    Some(ItemAnchor {
        index,
        offset_before: viewport.item_offset(index)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Uniform rows of `row` pixels, `above` pixels of loader before the first item.
    struct Rows {
        top: f32,
        count: usize,
        row: f32,
        above: f32,
        client: f32,
    }

    impl ScrollViewport for Rows {
        fn metrics(&self) -> ViewportMetrics {
            ViewportMetrics::new(self.top, self.above + self.count as f32 * self.row, self.client)
        }

        fn set_scroll_top(&mut self, scroll_top: f32) {
            self.top = scroll_top;
        }

        fn item_offset(&self, index: usize) -> Option<f32> {
            (index < self.count).then(|| self.above + index as f32 * self.row)
        }
    }

    #[test]
    fn prepend_shifts_by_height_delta() {
        let mut compensator = ScrollAnchorCompensator::new(ListShape::Bidirectional, false);
        compensator.capture(
            FetchDirection::Backward,
            ViewportAnchor::from_metrics(ViewportMetrics::new(0.0, 1000.0, 300.0)),
        );
        compensator
            .arm(
                FetchDirection::Backward,
                ScrollIntent::Prepended {
                    items: 10,
                    evicted_bottom: 0,
                },
                None,
            )
            .unwrap();

        let after = Rows {
            top: 0.0,
            count: 35,
            row: 40.0,
            above: 0.0,
            client: 300.0,
        };
        let settlement = compensator.settle_dom(&after, 35);
        assert_eq!(settlement.command, Some(ScrollCommand::ToOffset(400.0)));
        assert_eq!(settlement.released.as_slice(), &[FetchDirection::Backward]);
        assert!(!compensator.is_pending());
    }

    #[test]
    fn append_with_top_eviction_uses_one_combined_pair() {
        let before = Rows {
            top: 900.0,
            count: 30,
            row: 40.0,
            above: 0.0,
            client: 200.0,
        };
        let anchor = ViewportAnchor::from_metrics(before.metrics())
            .with_item(pick_item_anchor(&before, 10..30, before.top));
        assert_eq!(anchor.item.map(|item| item.index), Some(23));

        let mut compensator = ScrollAnchorCompensator::new(ListShape::Forward, false);
        compensator
            .arm(
                FetchDirection::Forward,
                ScrollIntent::Appended {
                    items: 10,
                    evicted_top: 10,
                },
                Some(anchor),
            )
            .unwrap();

        // Same height after: a naive height delta would leave the offset untouched.
        let after = Rows { top: 900.0, ..before };
        let settlement = compensator.settle_dom(&after, 30);
        assert_eq!(settlement.command, Some(ScrollCommand::ToOffset(500.0)));
    }

    #[test]
    fn plain_append_holds_without_scrolling() {
        let mut compensator = ScrollAnchorCompensator::new(ListShape::Forward, false);
        compensator
            .arm(
                FetchDirection::Forward,
                ScrollIntent::Appended {
                    items: 10,
                    evicted_top: 0,
                },
                None,
            )
            .unwrap();
        assert_eq!(compensator.pending_directions(), &[FetchDirection::Forward]);
        let settlement = compensator.settle_virtual(0, 20);
        assert_eq!(settlement.command, None);
        assert_eq!(settlement.released.as_slice(), &[FetchDirection::Forward]);
    }

    #[test]
    fn top_growth_without_anchor_is_a_violation() {
        let mut compensator = ScrollAnchorCompensator::new(ListShape::Reverse, false);
        let err = compensator
            .arm(
                FetchDirection::Forward,
                ScrollIntent::Prepended {
                    items: 10,
                    evicted_bottom: 0,
                },
                None,
            )
            .unwrap_err();
        assert_eq!(
            err,
            InvariantViolation::CompensationWithoutAnchor {
                direction: FetchDirection::Forward
            }
        );
    }

    #[test]
    fn merged_commits_keep_first_anchor() {
        let before = Rows {
            top: 200.0,
            count: 20,
            row: 40.0,
            above: 0.0,
            client: 200.0,
        };
        let anchor = ViewportAnchor::from_metrics(before.metrics())
            .with_item(pick_item_anchor(&before, 0..20, before.top));

        let mut compensator = ScrollAnchorCompensator::new(ListShape::Bidirectional, false);
        compensator
            .arm(
                FetchDirection::Backward,
                ScrollIntent::Prepended {
                    items: 10,
                    evicted_bottom: 0,
                },
                Some(anchor),
            )
            .unwrap();
        compensator
            .arm(
                FetchDirection::Forward,
                ScrollIntent::Appended {
                    items: 10,
                    evicted_top: 0,
                },
                None,
            )
            .unwrap();

        let after = Rows {
            count: 40,
            ..before
        };
        let settlement = compensator.settle_dom(&after, 40);
        // Item 5 moved to index 15: 200 + (600 - 200).
        assert_eq!(settlement.command, Some(ScrollCommand::ToOffset(600.0)));
        assert_eq!(settlement.released.len(), 2);
    }

    #[test]
    fn append_then_prepend_before_layout_keeps_the_first_anchor() {
        let before = Rows {
            top: 650.0,
            count: 10,
            row: 100.0,
            above: 0.0,
            client: 300.0,
        };
        // The store already holds 20 items when the second commit lands, but only
        // 10 rows are laid out.
        let stale = pick_item_anchor(&before, 0..20, before.top);
        assert_eq!(stale.map(|item| item.index), Some(7));

        let anchor = ViewportAnchor::from_metrics(before.metrics())
            .with_item(pick_item_anchor(&before, 0..10, before.top));
        let mut compensator = ScrollAnchorCompensator::new(ListShape::Bidirectional, false);
        compensator
            .arm(
                FetchDirection::Forward,
                ScrollIntent::Appended {
                    items: 10,
                    evicted_top: 0,
                },
                Some(anchor),
            )
            .unwrap();
        compensator
            .arm(
                FetchDirection::Backward,
                ScrollIntent::Prepended {
                    items: 10,
                    evicted_bottom: 0,
                },
                None,
            )
            .unwrap();

        let after = Rows {
            count: 30,
            ..before
        };
        let settlement = compensator.settle_dom(&after, 30);
        // Item 7 moved to index 17: 650 + (1700 - 700). The height delta would say 2650.
        assert_eq!(settlement.command, Some(ScrollCommand::ToOffset(1650.0)));
        assert_eq!(settlement.released.len(), 2);
    }

    #[test]
    fn lost_anchor_after_append_leaves_scroll_alone() {
        let before = Rows {
            top: 100.0,
            count: 10,
            row: 100.0,
            above: 0.0,
            client: 300.0,
        };
        let anchor = ViewportAnchor::from_metrics(before.metrics())
            .with_item(pick_item_anchor(&before, 0..10, before.top));
        let mut compensator = ScrollAnchorCompensator::new(ListShape::Forward, false);
        compensator
            .arm(
                FetchDirection::Forward,
                ScrollIntent::Appended {
                    items: 10,
                    evicted_top: 10,
                },
                Some(anchor),
            )
            .unwrap();
        let after = Rows {
            count: 10,
            ..before
        };
        assert_eq!(compensator.settle_dom(&after, 10).command, None);
    }

    #[test]
    fn initial_scroll_depends_on_shape() {
        let rows = Rows {
            top: 0.0,
            count: 10,
            row: 40.0,
            above: 0.0,
            client: 200.0,
        };
        let mut bidi = ScrollAnchorCompensator::new(ListShape::Bidirectional, false);
        bidi.arm_initial(FetchDirection::ALL);
        assert_eq!(
            bidi.settle_dom(&rows, 10).command,
            Some(ScrollCommand::ToOffset(200.0))
        );

        let mut forward = ScrollAnchorCompensator::new(ListShape::Forward, false);
        forward.arm_initial([FetchDirection::Forward]);
        assert_eq!(forward.settle_dom(&rows, 10).command, None);

        let mut reverse = ScrollAnchorCompensator::new(ListShape::Reverse, true);
        reverse.arm_initial([FetchDirection::Forward]);
        assert_eq!(
            reverse.settle_virtual(1, 10).command,
            Some(ScrollCommand::ToIndex {
                index: 10,
                align: ScrollAlign::End
            })
        );
    }

    #[test]
    fn virtual_prepend_scrolls_to_shifted_row() {
        let mut compensator = ScrollAnchorCompensator::new(ListShape::Bidirectional, true);
        let anchor = ViewportAnchor {
            scroll_top_before: 0.0,
            scroll_height_before: 0.0,
            item: Some(ItemAnchor {
                index: 0,
                offset_before: 0.0,
            }),
        };
        compensator
            .arm(
                FetchDirection::Backward,
                ScrollIntent::Prepended {
                    items: 10,
                    evicted_bottom: 10,
                },
                Some(anchor),
            )
            .unwrap();
        assert_eq!(
            compensator.settle_virtual(1, 30).command,
            Some(ScrollCommand::ToIndex {
                index: 11,
                align: ScrollAlign::Start
            })
        );
    }
}
