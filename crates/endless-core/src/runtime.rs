use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::thread::ThreadId;

use crate::platform::RuntimeScheduler;

struct TaskEntry {
    id: u64,
    future: Pin<Box<dyn Future<Output = ()> + 'static>>,
}

struct RuntimeInner {
    scheduler: Arc<dyn RuntimeScheduler>,
    needs_frame: Cell<bool>,
    tasks: RefCell<Vec<TaskEntry>>,
    // Ids cancelled while their entry was checked out for polling.
    cancelled: RefCell<Vec<u64>>,
    next_task_id: Cell<u64>,
    task_waker: RefCell<Option<Waker>>,
    woken: Arc<AtomicBool>,
    ui_thread_id: ThreadId,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            scheduler,
            needs_frame: Cell::new(false),
            tasks: RefCell::new(Vec::new()),
            cancelled: RefCell::new(Vec::new()),
            next_task_id: Cell::new(1),
            task_waker: RefCell::new(None),
            woken: Arc::new(AtomicBool::new(false)),
            ui_thread_id: std::thread::current().id(),
        }
    }

    fn init_task_waker(this: &Rc<Self>) {
        let waker = RuntimeTaskWaker {
            scheduler: Arc::clone(&this.scheduler),
            woken: Arc::clone(&this.woken),
        }
        .into_waker();
        *this.task_waker.borrow_mut() = Some(waker);
    }

    fn schedule(&self) {
        self.needs_frame.set(true);
        self.scheduler.schedule_frame();
    }

    fn spawn_ui_task(&self, future: Pin<Box<dyn Future<Output = ()> + 'static>>) -> u64 {
        let id = self.next_task_id.get();
        self.next_task_id.set(id + 1);
        self.tasks.borrow_mut().push(TaskEntry { id, future });
        self.schedule();
        id
    }

    fn cancel_task(&self, id: u64) {
        let mut tasks = self.tasks.borrow_mut();
        let before = tasks.len();
        tasks.retain(|entry| entry.id != id);
        if tasks.len() == before {
            // Not in the table: either finished or currently being polled.
            self.cancelled.borrow_mut().push(id);
        }
    }

    fn poll_async_tasks(&self) -> bool {
        let waker = match self.task_waker.borrow().as_ref() {
            Some(waker) => waker.clone(),
            None => return false,
        };
        self.woken.store(false, Ordering::SeqCst);
        let mut cx = Context::from_waker(&waker);
        let tasks = std::mem::take(&mut *self.tasks.borrow_mut());
        let mut pending = Vec::with_capacity(tasks.len());
        let mut made_progress = false;
        for mut entry in tasks {
            if self.take_cancelled(entry.id) {
                continue;
            }
            match entry.future.as_mut().poll(&mut cx) {
                Poll::Ready(()) => {
                    made_progress = true;
                }
                Poll::Pending => {
                    pending.push(entry);
                }
            }
        }
        pending.retain(|entry| !self.take_cancelled(entry.id));
        self.cancelled.borrow_mut().clear();
        if !pending.is_empty() {
            // Tasks spawned while polling were pushed to the live table already.
            let mut live = self.tasks.borrow_mut();
            let spawned = std::mem::take(&mut *live);
            live.extend(pending);
            live.extend(spawned);
        }
        made_progress || self.woken.load(Ordering::SeqCst)
    }

    fn take_cancelled(&self, id: u64) -> bool {
        let mut cancelled = self.cancelled.borrow_mut();
        match cancelled.iter().position(|&cancelled_id| cancelled_id == id) {
            Some(index) => {
                cancelled.swap_remove(index);
                true
            }
            None => false,
        }
    }

    fn drain_ui(&self) {
        while self.poll_async_tasks() {}
        if !self.has_pending_ui() {
            self.needs_frame.set(false);
        }
    }

    fn has_pending_ui(&self) -> bool {
        self.woken.load(Ordering::SeqCst)
    }

    fn active_task_count(&self) -> usize {
        self.tasks.try_borrow().map(|tasks| tasks.len()).unwrap_or(0)
    }
}

/// Owner of the UI-thread task queue. Dropping it invalidates every handle.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        let inner = Rc::new(RuntimeInner::new(scheduler));
        RuntimeInner::init_task_waker(&inner);
        Self { inner }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn needs_frame(&self) -> bool {
        self.inner.needs_frame.get()
    }
}

/// Weak handle to a [`Runtime`], cheap to clone into controllers.
#[derive(Clone)]
pub struct RuntimeHandle {
    inner: Weak<RuntimeInner>,
}

/// Handle to a spawned UI future.
pub struct TaskHandle {
    id: u64,
    runtime: RuntimeHandle,
}

impl RuntimeHandle {
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    pub fn schedule(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.schedule();
        }
    }

    /// Spawns a future onto the UI thread. Returns `None` when the runtime was dropped.
    pub fn spawn_ui<F>(&self, fut: F) -> Option<TaskHandle>
    where
        F: Future<Output = ()> + 'static,
    {
        self.inner.upgrade().map(|inner| {
            let id = inner.spawn_ui_task(Box::pin(fut));
            TaskHandle {
                id,
                runtime: self.clone(),
            }
        })
    }

    pub fn cancel_task(&self, id: u64) {
        if let Some(inner) = self.inner.upgrade() {
            inner.cancel_task(id);
        }
    }

    /// Polls spawned futures until nothing makes progress.
    pub fn drain_ui(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.drain_ui();
        }
    }

    pub fn has_pending_ui(&self) -> bool {
        self.inner
            .upgrade()
            .map(|inner| inner.has_pending_ui())
            .unwrap_or(false)
    }

    /// Number of spawned futures that have not completed yet.
    pub fn active_task_count(&self) -> usize {
        self.inner
            .upgrade()
            .map(|inner| inner.active_task_count())
            .unwrap_or(0)
    }

    pub fn assert_ui_thread(&self) {
        if let Some(inner) = self.inner.upgrade() {
            debug_assert_eq!(
                std::thread::current().id(),
                inner.ui_thread_id,
                "paging state mutated off the runtime's UI thread"
            );
        }
    }
}

impl TaskHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(self) {
        log::trace!("cancelling UI task {}", self.id);
        self.runtime.cancel_task(self.id);
    }
}

struct RuntimeTaskWaker {
    scheduler: Arc<dyn RuntimeScheduler>,
    woken: Arc<AtomicBool>,
}

impl RuntimeTaskWaker {
    fn into_waker(self) -> Waker {
        futures_task::waker(Arc::new(self))
    }
}

impl futures_task::ArcWake for RuntimeTaskWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.woken.store(true, Ordering::SeqCst);
        arc_self.scheduler.schedule_frame();
    }
}
