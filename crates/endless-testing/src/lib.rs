//! Testing utilities and harness for Endless
//!
//! Headless stand-ins for everything an infinite list talks to: a scroll
//! viewport with explicit layout, a fixed-row virtualization engine, a
//! scripted page source whose fetches resolve when the test says so, and
//! [`InfiniteListTestRule`] tying them to a mounted list.

pub mod rule;
pub mod source;
pub mod viewport;
pub mod virtualizer;

pub use rule::*;
pub use source::*;
pub use viewport::*;
pub use virtualizer::*;

pub mod prelude {
    pub use crate::rule::*;
    pub use crate::source::*;
    pub use crate::viewport::*;
    pub use crate::virtualizer::*;
}
