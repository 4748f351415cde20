//! Platform abstraction traits for the Endless runtime.
//!
//! The runtime never drives itself: a host (browser event loop, native
//! toolkit, test harness) is asked to schedule a frame and then calls
//! [`RuntimeHandle::drain_ui`](crate::RuntimeHandle::drain_ui) on the UI thread.

/// Schedules work for the Endless runtime.
///
/// Implementations are responsible for arranging a call to `drain_ui` on the
/// UI thread. They must be safe to use from multiple threads because wakers
/// handed to fetch futures may fire from anywhere.
pub trait RuntimeScheduler: Send + Sync {
    /// Request that the host schedule a new frame.
    fn schedule_frame(&self);
}

/// Scheduler that ignores frame requests.
///
/// Useful when the host already drains the runtime on every frame.
#[derive(Default)]
pub struct DefaultScheduler;

impl RuntimeScheduler for DefaultScheduler {
    fn schedule_frame(&self) {}
}
