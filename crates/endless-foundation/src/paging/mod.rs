//! Bidirectional, scroll-anchored pagination.
//!
//! # Architecture
//!
//! - [`PageStore`] - ordered window of fetched pages plus the edge cursors
//! - [`FetchCoordinator`] - per-direction [`EdgeState`] gate (one fetch in flight per edge)
//! - [`ScrollAnchorCompensator`] - keeps the visual anchor fixed across prepends and evictions
//! - [`ProximitySensor`] - sentinel visibility, reported as [`Edge`] events
//! - [`VirtualizationAdapter`] - index-based edge detection for virtualized hosts
//! - [`InfiniteListController`] - wires the above to a [`PageSource`] on the UI runtime
//!
//! Data flows sensor -> coordinator -> store -> compensator -> host. Only the
//! compensator produces scroll writes; the host applies them verbatim.

mod compensator;
mod config;
mod controller;
mod coordinator;
mod direction;
mod error;
mod page;
mod page_store;
mod sensor;
mod source;
mod viewport;
mod virtual_adapter;

pub use compensator::*;
pub use config::*;
pub use controller::*;
pub use coordinator::*;
pub use direction::*;
pub use error::*;
pub use page::*;
pub use page_store::*;
pub use sensor::*;
pub use source::*;
pub use viewport::*;
pub use virtual_adapter::*;
