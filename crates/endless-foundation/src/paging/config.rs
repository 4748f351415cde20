//! Controller configuration.

use super::direction::ListShape;
use super::error::ConfigError;

/// Default sentinel visibility required before an edge fires.
pub const DEFAULT_VISIBILITY_THRESHOLD: f32 = 1.0;

/// Default sentinel height. Zero matches an empty marker element.
pub const DEFAULT_SENTINEL_EXTENT: f32 = 0.0;

/// Configuration for an [`InfiniteListController`](super::InfiniteListController).
///
/// Built with consuming `with_*` methods and checked by [`validate`](Self::validate)
/// when the controller is created.
#[derive(Clone, Debug)]
pub struct InfiniteListConfig<C> {
    pub shape: ListShape,
    /// Whether the host is a virtualization engine rather than a plain viewport.
    pub virtualized: bool,
    /// Fraction of a sentinel that must be visible, in `(0, 1]`.
    pub threshold: f32,
    /// Rows rendered beyond the viewport by the virtualization engine.
    pub overscan: usize,
    /// Retained page cap. `None` keeps every page.
    pub max_pages: Option<usize>,
    /// Cursor for the very first fetch. `None` lets the source pick its default.
    pub initial_cursor: Option<C>,
    /// Height of each sentinel region.
    pub sentinel_extent: f32,
}

impl<C> Default for InfiniteListConfig<C> {
    fn default() -> Self {
        Self {
            shape: ListShape::Forward,
            virtualized: false,
            threshold: DEFAULT_VISIBILITY_THRESHOLD,
            overscan: 0,
            max_pages: None,
            initial_cursor: None,
            sentinel_extent: DEFAULT_SENTINEL_EXTENT,
        }
    }
}

impl<C> InfiniteListConfig<C> {
    pub fn new(shape: ListShape) -> Self {
        Self {
            shape,
            ..Self::default()
        }
    }

    pub fn forward() -> Self {
        Self::new(ListShape::Forward)
    }

    pub fn reverse() -> Self {
        Self::new(ListShape::Reverse)
    }

    pub fn bidirectional() -> Self {
        Self::new(ListShape::Bidirectional)
    }

    pub fn virtualized(mut self) -> Self {
        self.virtualized = true;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn with_initial_cursor(mut self, cursor: C) -> Self {
        self.initial_cursor = Some(cursor);
        self
    }

    pub fn with_sentinel_extent(mut self, extent: f32) -> Self {
        self.sentinel_extent = extent;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(ConfigError::ThresholdOutOfRange(self.threshold));
        }
        if self.max_pages == Some(0) {
            return Err(ConfigError::ZeroMaxPages);
        }
        if !self.sentinel_extent.is_finite() || self.sentinel_extent < 0.0 {
            return Err(ConfigError::InvalidSentinelExtent(self.sentinel_extent));
        }
        Ok(())
    }
}
