//! Core runtime for Endless: the UI-thread executor that fetch futures run on.
//!
//! All paging state transitions happen on one thread. Futures spawned with
//! [`RuntimeHandle::spawn_ui`] are polled from [`RuntimeHandle::drain_ui`], so
//! their continuations may freely capture `Rc`/`RefCell` state.

mod platform;
mod runtime;

pub use platform::*;
pub use runtime::*;
