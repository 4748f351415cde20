//! Headless harness for end-to-end list tests.
//!
//! [`InfiniteListTestRule`] owns a runtime, a [`ScriptedPageSource`] and an
//! [`InfiniteList`] mounted on a headless host. Each [`pump`](InfiniteListTestRule::pump)
//! is one frame the way a browser runs it: settled fetches commit, the host lays
//! out the new rows, then the list's frame hook runs.
//!
//! # Example
//!
//! ```
//! use endless_foundation::paging::InfiniteListConfig;
//! use endless_testing::InfiniteListTestRule;
//!
//! let mut rule = InfiniteListTestRule::new(InfiniteListConfig::forward(), 300.0).unwrap();
//! rule.mount();
//! rule.wait_for_idle();
//! assert_eq!(rule.controller().item_count(), 10);
//! ```

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use endless_core::{DefaultScheduler, Runtime};
use endless_foundation::paging::{
    ConfigError, Edge, InfiniteListConfig, InfiniteListController, Page, ViewportHost,
    VirtualizationEngine,
};
use endless_ui::{InfiniteList, ListRow};

use crate::source::{NumberFeed, ScriptedPageSource};
use crate::viewport::HeadlessViewport;
use crate::virtualizer::FixedSizeVirtualizer;

/// Default item row height for plain viewports.
pub const DEFAULT_ROW_HEIGHT: f32 = 40.0;

const MAX_IDLE_PUMPS: usize = 64;

#[derive(Clone)]
enum TestHost {
    Dom(Rc<RefCell<HeadlessViewport>>),
    Virtual(Rc<RefCell<FixedSizeVirtualizer>>),
}

impl TestHost {
    fn to_host(&self) -> ViewportHost {
        match self {
            TestHost::Dom(viewport) => ViewportHost::dom(Rc::clone(viewport)),
            TestHost::Virtual(engine) => ViewportHost::virtualized(Rc::clone(engine)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct IdleSnapshot {
    calls: usize,
    pending: usize,
    items: usize,
    scroll: f32,
    compensating: bool,
    ui_pending: bool,
}

/// Main test rule for infinite lists.
pub struct InfiniteListTestRule {
    list: InfiniteList<ScriptedPageSource>,
    source: ScriptedPageSource,
    host: TestHost,
    row_height: Box<dyn Fn(&i64) -> f32>,
    loader_height: f32,
    // Dropped last so the list can still cancel its tasks.
    runtime: Runtime,
}

impl InfiniteListTestRule {
    /// Plain viewport `client_height` tall over the default [`NumberFeed`].
    pub fn new(config: InfiniteListConfig<i64>, client_height: f32) -> Result<Self, ConfigError> {
        Self::with_source(ScriptedPageSource::new(NumberFeed::default()), config, client_height)
    }

    pub fn with_source(
        source: ScriptedPageSource,
        config: InfiniteListConfig<i64>,
        client_height: f32,
    ) -> Result<Self, ConfigError> {
        let host = TestHost::Dom(Rc::new(RefCell::new(HeadlessViewport::new(client_height))));
        Self::build(source, config, host)
    }

    /// Virtualized list over a [`FixedSizeVirtualizer`]. `config` must be virtualized.
    pub fn virtualized(
        source: ScriptedPageSource,
        config: InfiniteListConfig<i64>,
        row_height: f32,
        viewport_height: f32,
    ) -> Result<Self, ConfigError> {
        let engine = FixedSizeVirtualizer::new(row_height, viewport_height);
        Self::build(source, config, TestHost::Virtual(Rc::new(RefCell::new(engine))))
    }

    fn build(
        source: ScriptedPageSource,
        config: InfiniteListConfig<i64>,
        host: TestHost,
    ) -> Result<Self, ConfigError> {
        let runtime = Runtime::new(Arc::new(DefaultScheduler));
        let list = InfiniteList::new(source.clone(), config, runtime.handle())?;
        Ok(Self {
            list,
            source,
            host,
            row_height: Box::new(|_| DEFAULT_ROW_HEIGHT),
            loader_height: 0.0,
            runtime,
        })
    }

    /// Height of the row showing `item`. Plain viewports only.
    pub fn with_row_height(mut self, row_height: impl Fn(&i64) -> f32 + 'static) -> Self {
        self.row_height = Box::new(row_height);
        self
    }

    /// Height of loader and status rows. Zero by default.
    pub fn with_loader_height(mut self, loader_height: f32) -> Self {
        self.loader_height = loader_height;
        self
    }

    pub fn list(&self) -> &InfiniteList<ScriptedPageSource> {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut InfiniteList<ScriptedPageSource> {
        &mut self.list
    }

    pub fn controller(&self) -> &InfiniteListController<ScriptedPageSource> {
        self.list.controller()
    }

    pub fn source(&self) -> &ScriptedPageSource {
        &self.source
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// The plain viewport. Panics for virtualized rules.
    pub fn viewport(&self) -> Rc<RefCell<HeadlessViewport>> {
        match &self.host {
            TestHost::Dom(viewport) => Rc::clone(viewport),
            TestHost::Virtual(_) => panic!("virtualized rule has no plain viewport"),
        }
    }

    /// The virtualization engine. Panics for plain rules.
    pub fn engine(&self) -> Rc<RefCell<FixedSizeVirtualizer>> {
        match &self.host {
            TestHost::Virtual(engine) => Rc::clone(engine),
            TestHost::Dom(_) => panic!("plain rule has no virtualization engine"),
        }
    }

    /// Mounts the list, which starts the first fetch.
    pub fn mount(&mut self) {
        let host = self.host.to_host();
        if let Err(err) = self.list.mount(host) {
            panic!("mount failed: {err}");
        }
    }

    pub fn mount_hydrated(&mut self, page: Page<i64, i64>) {
        let host = self.host.to_host();
        if let Err(err) = self.list.mount_hydrated(host, page) {
            panic!("mount failed: {err}");
        }
    }

    pub fn unmount(&mut self) {
        self.list.unmount();
    }

    /// One frame: commit settled fetches, lay out, run the list's frame hook.
    pub fn pump(&mut self) {
        self.runtime.handle().drain_ui();
        self.layout();
        self.list.frame();
    }

    /// Pumps until a frame changes nothing. Fetches a deferred source holds back
    /// stay in flight. Returns whether the list went idle.
    pub fn wait_for_idle(&mut self) -> bool {
        let mut previous = None;
        for _ in 0..MAX_IDLE_PUMPS {
            self.pump();
            let snapshot = self.snapshot();
            if !snapshot.compensating && !snapshot.ui_pending && previous.as_ref() == Some(&snapshot) {
                return true;
            }
            previous = Some(snapshot);
        }
        log::warn!("list still busy after {MAX_IDLE_PUMPS} frames");
        false
    }

    fn snapshot(&self) -> IdleSnapshot {
        let scroll = match &self.host {
            TestHost::Dom(viewport) => viewport.borrow().scroll_top(),
            TestHost::Virtual(engine) => engine.borrow().scroll_offset(),
        };
        IdleSnapshot {
            calls: self.source.call_count(),
            pending: self.runtime.handle().active_task_count(),
            items: self.controller().item_count(),
            scroll,
            compensating: self.controller().has_pending_compensation(),
            ui_pending: self.runtime.handle().has_pending_ui(),
        }
    }

    /// Lays the current rows out in the plain viewport. Virtual hosts size
    /// themselves through the controller.
    pub fn layout(&mut self) {
        let TestHost::Dom(viewport) = &self.host else {
            return;
        };
        let mut leading = 0.0;
        let mut trailing = 0.0;
        let mut heights = Vec::new();
        for row in self.list.rows() {
            match row {
                ListRow::Status(_) | ListRow::Loader { edge: Edge::Top, .. } => {
                    leading += self.loader_height
                }
                ListRow::Loader { edge: Edge::Bottom, .. } => trailing += self.loader_height,
                ListRow::Item { item, .. } => heights.push((self.row_height)(&item)),
            }
        }
        viewport.borrow_mut().layout(leading, heights, trailing);
    }

    /// User scroll to `offset`.
    pub fn scroll_to(&mut self, offset: f32) {
        match &self.host {
            TestHost::Dom(viewport) => viewport.borrow_mut().scroll_to(offset),
            TestHost::Virtual(engine) => engine.borrow_mut().scroll_to_offset(offset),
        }
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_to(0.0);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_to(f32::MAX);
    }

    pub fn scroll_top(&self) -> f32 {
        match &self.host {
            TestHost::Dom(viewport) => viewport.borrow().scroll_top(),
            TestHost::Virtual(engine) => engine.borrow().scroll_offset(),
        }
    }

    pub fn scroll_height(&self) -> f32 {
        match &self.host {
            TestHost::Dom(viewport) => viewport.borrow().scroll_height(),
            TestHost::Virtual(engine) => engine.borrow().total_size(),
        }
    }

    /// First item (by value) whose row is inside the plain viewport.
    pub fn first_visible_item(&self) -> Option<i64> {
        let index = self.viewport().borrow().visible_items().start;
        self.controller().item(index)
    }

    /// Items (by value) whose rows are inside the plain viewport.
    pub fn visible_items(&self) -> Vec<i64> {
        let range = self.viewport().borrow().visible_items();
        range.filter_map(|index| self.controller().item(index)).collect()
    }
}
