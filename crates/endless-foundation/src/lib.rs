//! Foundation elements for Endless: the paging core behind every list variant.
//!
//! The [`paging`] module holds the scroll-anchored pagination controller and the
//! pieces it is built from. Nothing here renders; hosts plug in through
//! [`paging::ScrollViewport`] or [`paging::VirtualizationEngine`].

pub mod paging;

pub use paging::*;

pub mod prelude {
    pub use crate::paging::{
        Edge, FetchDirection, InfiniteListConfig, InfiniteListController, ListShape, ListStatus,
        Page, PageFuture, PageSource, PagingError, ScrollAlign, ScrollCommand, ScrollViewport,
        TriggerSkipped, ViewportHost, ViewportMetrics, VirtualizationEngine,
    };
}
