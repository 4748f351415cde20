//! Sentinel visibility for plain viewports.
//!
//! The sensor knows nothing about pages: it is told which edges carry a
//! sentinel and reports when one of them comes into view.

use smallvec::SmallVec;

use super::direction::Edge;
use super::error::SensorError;
use super::viewport::ViewportMetrics;

/// Maximum reasonable viewport height before treating it as unbounded.
/// A list placed in an unconstrained parent would see every sentinel at once.
const MAX_REASONABLE_VIEWPORT: f32 = 100_000.0;

/// Edges that currently carry a sentinel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SentinelSet {
    pub top: bool,
    pub bottom: bool,
}

impl SentinelSet {
    pub fn new(top: bool, bottom: bool) -> Self {
        Self { top, bottom }
    }

    pub fn is_empty(&self) -> bool {
        !self.top && !self.bottom
    }

    pub fn contains(&self, edge: Edge) -> bool {
        match edge {
            Edge::Top => self.top,
            Edge::Bottom => self.bottom,
        }
    }

    fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        [Edge::Top, Edge::Bottom]
            .into_iter()
            .filter(|&edge| self.contains(edge))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProximitySensor {
    threshold: f32,
    extent: f32,
}

impl ProximitySensor {
    /// `threshold` is the visible fraction required, `extent` the sentinel height.
    pub fn new(threshold: f32, extent: f32) -> Self {
        Self { threshold, extent }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Starts observing `sentinels`. The returned guard disconnects on drop.
    pub fn observe(
        &self,
        sentinels: SentinelSet,
        metrics: ViewportMetrics,
    ) -> Result<Observation, SensorError> {
        if !metrics.is_finite() {
            return Err(SensorError::NonFiniteMetrics);
        }
        if metrics.client_height <= 0.0 {
            return Err(SensorError::EmptyViewport {
                client_height: metrics.client_height,
            });
        }
        if metrics.client_height > MAX_REASONABLE_VIEWPORT {
            return Err(SensorError::UnboundedViewport {
                client_height: metrics.client_height,
            });
        }
        log::trace!("observing sentinels {sentinels:?}");
        Ok(Observation {
            sensor: *self,
            sentinels,
            visible: [false; 2],
        })
    }

    /// Whether the sentinel at `edge` is visible at or above the threshold.
    pub fn is_intersecting(&self, edge: Edge, metrics: &ViewportMetrics) -> bool {
        let (start, end) = match edge {
            Edge::Top => (0.0, self.extent),
            Edge::Bottom => (
                (metrics.scroll_height - self.extent).max(0.0),
                metrics.scroll_height,
            ),
        };
        let view_start = metrics.scroll_top;
        let view_end = metrics.scroll_bottom();
        if end - start <= f32::EPSILON {
            // A zero-height marker is either inside the viewport or not.
            return start >= view_start && start <= view_end;
        }
        let visible = (end.min(view_end) - start.max(view_start)).max(0.0);
        visible / (end - start) >= self.threshold
    }
}

/// Live observation of a sentinel set. Dropping it disconnects.
#[derive(Debug)]
pub struct Observation {
    sensor: ProximitySensor,
    sentinels: SentinelSet,
    visible: [bool; 2],
}

impl Observation {
    pub fn sentinels(&self) -> SentinelSet {
        self.sentinels
    }

    /// Re-evaluates visibility and returns the edges that just came into view.
    ///
    /// The first poll after `observe` reports sentinels that are already visible.
    pub fn poll(&mut self, metrics: &ViewportMetrics) -> SmallVec<[Edge; 2]> {
        let mut entered = SmallVec::new();
        if !metrics.is_finite() {
            return entered;
        }
        for edge in self.sentinels.edges() {
            let slot = match edge {
                Edge::Top => 0,
                Edge::Bottom => 1,
            };
            let now = self.sensor.is_intersecting(edge, metrics);
            if now && !self.visible[slot] {
                log::trace!("{edge} sentinel intersecting at scroll_top {}", metrics.scroll_top);
                entered.push(edge);
            }
            self.visible[slot] = now;
        }
        entered
    }
}

impl Drop for Observation {
    fn drop(&mut self) {
        log::trace!("sentinel observation disconnected");
    }
}
