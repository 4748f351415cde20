//! Host-side seams: the scrollable viewport and the scroll writes applied to it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::virtual_adapter::VirtualizationEngine;

/// Live scroll metrics of the viewport, in host pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewportMetrics {
    pub scroll_top: f32,
    /// Total height of the scrollable content.
    pub scroll_height: f32,
    /// Visible height of the viewport.
    pub client_height: f32,
}

impl ViewportMetrics {
    pub fn new(scroll_top: f32, scroll_height: f32, client_height: f32) -> Self {
        Self {
            scroll_top,
            scroll_height,
            client_height,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.scroll_top.is_finite() && self.scroll_height.is_finite() && self.client_height.is_finite()
    }

    /// Bottom of the visible region in content coordinates.
    pub fn scroll_bottom(&self) -> f32 {
        self.scroll_top + self.client_height
    }

    /// Largest scroll offset the content allows.
    pub fn max_scroll_top(&self) -> f32 {
        (self.scroll_height - self.client_height).max(0.0)
    }
}

/// Where a row lands in the viewport after a scroll-to-index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScrollAlign {
    #[default]
    Start,
    Center,
    End,
    /// Scroll the least distance that makes the row fully visible.
    Auto,
}

/// A scroll write produced by the compensator. Hosts apply it verbatim.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScrollCommand {
    /// Set `scroll_top` directly.
    ToOffset(f32),
    /// Scroll so that host row `index` sits at `align`.
    ToIndex { index: usize, align: ScrollAlign },
}

/// A plain (non-virtualized) scroll container.
///
/// Item indices are positions in display order, loader rows excluded.
pub trait ScrollViewport {
    fn metrics(&self) -> ViewportMetrics;

    fn set_scroll_top(&mut self, scroll_top: f32);

    /// Offset of the top of item `index` from the top of the content, once laid out.
    ///
    /// Hosts that cannot measure items return `None`; anchoring then falls back to
    /// total height deltas.
    fn item_offset(&self, _index: usize) -> Option<f32> {
        None
    }
}

/// The host a controller drives: either a scroll container with real sentinels, or
/// a virtualization engine with synthetic loader rows.
#[derive(Clone)]
pub enum ViewportHost {
    Dom(Rc<RefCell<dyn ScrollViewport>>),
    Virtual(Rc<RefCell<dyn VirtualizationEngine>>),
}

impl ViewportHost {
    pub fn dom<V: ScrollViewport + 'static>(viewport: Rc<RefCell<V>>) -> Self {
        ViewportHost::Dom(viewport)
    }

    pub fn virtualized<E: VirtualizationEngine + 'static>(engine: Rc<RefCell<E>>) -> Self {
        ViewportHost::Virtual(engine)
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self, ViewportHost::Virtual(_))
    }

    /// Current scroll metrics. Virtual hosts report their total size with offset zero.
    pub fn metrics(&self) -> ViewportMetrics {
        match self {
            ViewportHost::Dom(viewport) => viewport.borrow().metrics(),
            ViewportHost::Virtual(engine) => {
                ViewportMetrics::new(0.0, engine.borrow().total_size(), 0.0)
            }
        }
    }

    pub fn apply(&self, command: ScrollCommand) {
        match (self, command) {
            (ViewportHost::Dom(viewport), ScrollCommand::ToOffset(offset)) => {
                viewport.borrow_mut().set_scroll_top(offset);
            }
            (ViewportHost::Dom(viewport), ScrollCommand::ToIndex { index, .. }) => {
                let offset = viewport.borrow().item_offset(index);
                match offset {
                    Some(offset) => viewport.borrow_mut().set_scroll_top(offset),
                    None => log::warn!("viewport cannot locate item {index}, scroll dropped"),
                }
            }
            (ViewportHost::Virtual(engine), ScrollCommand::ToIndex { index, align }) => {
                engine.borrow_mut().scroll_to_index(index, align);
            }
            (ViewportHost::Virtual(_), ScrollCommand::ToOffset(offset)) => {
                log::warn!("virtualized host ignores raw scroll offset {offset}");
            }
        }
    }
}

impl fmt::Debug for ViewportHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewportHost::Dom(_) => f.write_str("ViewportHost::Dom"),
            ViewportHost::Virtual(_) => f.write_str("ViewportHost::Virtual"),
        }
    }
}
