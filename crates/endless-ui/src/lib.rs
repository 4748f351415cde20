//! Infinite list views for Endless.
//!
//! [`InfiniteList`] turns the paging controller into rows a host can draw:
//! loader rows at each loading edge, item rows in display order, and the
//! status line shown before the first page arrives.

pub mod widgets;

pub use widgets::*;

pub mod prelude {
    pub use crate::widgets::{EdgeMessages, InfiniteList, ListRow};
    pub use endless_foundation::prelude::*;
}
