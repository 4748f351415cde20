//! Data directions, visual edges, and the list shapes that map one onto the other.

use std::fmt;

/// Direction of a fetch in cursor space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FetchDirection {
    /// Towards `next_cursor`.
    Forward,
    /// Towards `prev_cursor`.
    Backward,
}

impl FetchDirection {
    pub const ALL: [FetchDirection; 2] = [FetchDirection::Forward, FetchDirection::Backward];

    pub fn opposite(self) -> Self {
        match self {
            FetchDirection::Forward => FetchDirection::Backward,
            FetchDirection::Backward => FetchDirection::Forward,
        }
    }

    #[inline]
    pub(crate) fn slot(self) -> usize {
        match self {
            FetchDirection::Forward => 0,
            FetchDirection::Backward => 1,
        }
    }
}

impl fmt::Display for FetchDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchDirection::Forward => f.write_str("forward"),
            FetchDirection::Backward => f.write_str("backward"),
        }
    }
}

/// Visual side of the scrollable content. Each edge may host a sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Edge {
    Top,
    Bottom,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Top => f.write_str("top"),
            Edge::Bottom => f.write_str("bottom"),
        }
    }
}

/// The list variants, collapsed into one parameter.
///
/// | shape           | top edge loads | bottom edge loads | display order     |
/// |-----------------|----------------|-------------------|-------------------|
/// | `Forward`       | -              | forward           | data order        |
/// | `Reverse`       | forward        | -                 | reversed          |
/// | `Bidirectional` | backward       | forward           | data order        |
///
/// `Reverse` is the newest-first timeline: the data source hands out
/// newest-first pages, older pages are fetched "forward" and shown above.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ListShape {
    #[default]
    Forward,
    Reverse,
    Bidirectional,
}

impl ListShape {
    /// Data direction fetched when the sentinel at `edge` becomes visible.
    pub fn direction_for(self, edge: Edge) -> Option<FetchDirection> {
        match (self, edge) {
            (ListShape::Forward, Edge::Bottom) => Some(FetchDirection::Forward),
            (ListShape::Forward, Edge::Top) => None,
            (ListShape::Reverse, Edge::Top) => Some(FetchDirection::Forward),
            (ListShape::Reverse, Edge::Bottom) => None,
            (ListShape::Bidirectional, Edge::Top) => Some(FetchDirection::Backward),
            (ListShape::Bidirectional, Edge::Bottom) => Some(FetchDirection::Forward),
        }
    }

    /// Visual edge where pages fetched in `direction` appear.
    pub fn edge_for(self, direction: FetchDirection) -> Option<Edge> {
        [Edge::Top, Edge::Bottom]
            .into_iter()
            .find(|&edge| self.direction_for(edge) == Some(direction))
    }

    /// Whether this shape ever fetches in `direction`.
    pub fn loads(self, direction: FetchDirection) -> bool {
        self.edge_for(direction).is_some()
    }

    /// Data end that is rendered at the top of the viewport.
    pub fn top_end(self) -> FetchDirection {
        match self {
            ListShape::Reverse => FetchDirection::Forward,
            ListShape::Forward | ListShape::Bidirectional => FetchDirection::Backward,
        }
    }

    pub fn is_reversed(self) -> bool {
        matches!(self, ListShape::Reverse)
    }

    pub fn has_top_loader(self) -> bool {
        self.direction_for(Edge::Top).is_some()
    }

    pub fn has_bottom_loader(self) -> bool {
        self.direction_for(Edge::Bottom).is_some()
    }
}
