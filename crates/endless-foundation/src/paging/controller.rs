//! The infinite list controller.
//!
//! One controller serves every list variant: the [`ListShape`] decides which
//! edges load and in which data direction, and the attached [`ViewportHost`]
//! decides whether edges are detected by sentinels or by rendered row indices.
//!
//! The controller is a cheap handle over shared state, like other UI state
//! holders. Fetches run as futures on the UI runtime; their completions hold a
//! weak reference and become no-ops once the controller is disposed or dropped.

use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;

use endless_core::{RuntimeHandle, TaskHandle};
use smallvec::SmallVec;

use super::compensator::{pick_item_anchor, ItemAnchor, ScrollAnchorCompensator, ScrollIntent, ViewportAnchor};
use super::config::InfiniteListConfig;
use super::coordinator::{EdgeState, FetchCoordinator, FetchTicket, TriggerSkipped};
use super::direction::{Edge, FetchDirection, ListShape};
use super::error::{ConfigError, InvariantViolation, PagingError, SensorError};
use super::page::Page;
use super::page_store::{EvictionPolicy, PageStore};
use super::sensor::{Observation, ProximitySensor, SentinelSet};
use super::source::PageSource;
use super::viewport::{ViewportHost, ViewportMetrics};
use super::virtual_adapter::VirtualizationAdapter;

/// Load state of the list as a whole, as shown before any item exists.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ListStatus {
    /// Nothing requested yet.
    #[default]
    Pending,
    /// First page in flight.
    Loading,
    Ready,
    /// First page failed. Retry with `load_initial`.
    Error(String),
}

struct ControllerInner<S: PageSource> {
    config: InfiniteListConfig<S::Cursor>,
    store: PageStore<S::Item, S::Cursor>,
    coordinator: FetchCoordinator,
    compensator: ScrollAnchorCompensator,
    sensor: ProximitySensor,
    observation: Option<Observation>,
    // Set after every settle so sentinels that stayed visible fire again.
    resubscribe: bool,
    sensor_error: Option<SensorError>,
    adapter: VirtualizationAdapter,
    synced_rows: Option<usize>,
    host: Option<ViewportHost>,
    status: ListStatus,
    errors: [Option<PagingError>; 2],
    tasks: Vec<(u64, TaskHandle)>,
    invalidate_callbacks: Vec<(u64, Rc<dyn Fn()>)>,
    next_callback_id: u64,
}

fn report_violation(violation: &InvariantViolation) {
    log::error!("paging invariant violated: {violation}");
    debug_assert!(false, "paging invariant violated: {violation}");
}

impl<S: PageSource> ControllerInner<S> {
    fn new(config: InfiniteListConfig<S::Cursor>) -> Self {
        let policy = match config.max_pages {
            Some(max_pages) => EvictionPolicy::capped(max_pages),
            None => EvictionPolicy::unbounded(),
        };
        Self {
            store: PageStore::new(policy),
            coordinator: FetchCoordinator::new(),
            compensator: ScrollAnchorCompensator::new(config.shape, config.virtualized),
            sensor: ProximitySensor::new(config.threshold, config.sentinel_extent),
            observation: None,
            resubscribe: false,
            sensor_error: None,
            adapter: VirtualizationAdapter::new(config.shape),
            synced_rows: None,
            host: None,
            status: ListStatus::Pending,
            errors: [None, None],
            tasks: Vec::new(),
            invalidate_callbacks: Vec::new(),
            next_callback_id: 1,
            config,
        }
    }

    fn shape(&self) -> ListShape {
        self.config.shape
    }

    fn grows_top(&self, direction: FetchDirection) -> bool {
        self.shape().edge_for(direction) == Some(Edge::Top)
    }

    fn callbacks(&self) -> Vec<Rc<dyn Fn()>> {
        self.invalidate_callbacks
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect()
    }

    /// Display indices that outlive a commit with `intent`.
    fn survivors(&self, intent: ScrollIntent) -> Range<usize> {
        let count = self.store.item_count();
        match intent {
            ScrollIntent::Initial => 0..count,
            ScrollIntent::Prepended { evicted_bottom, .. } => 0..count.saturating_sub(evicted_bottom),
            ScrollIntent::Appended { evicted_top, .. } => evicted_top.min(count)..count,
        }
    }

    fn sample_anchor(&self, survivors: Range<usize>) -> Option<ViewportAnchor> {
        match self.host.as_ref()? {
            ViewportHost::Dom(viewport) => {
                let viewport = viewport.borrow();
                let metrics = viewport.metrics();
                let item = pick_item_anchor(&*viewport, survivors, metrics.scroll_top);
                Some(ViewportAnchor::from_metrics(metrics).with_item(item))
            }
            ViewportHost::Virtual(engine) => {
                let engine = engine.borrow();
                let metrics = ViewportMetrics::new(0.0, engine.total_size(), 0.0);
                let item = engine
                    .visible_range()
                    .and_then(|range| self.adapter.first_item_in(&range))
                    .filter(|_| !survivors.is_empty())
                    .map(|index| ItemAnchor {
                        index: index.clamp(survivors.start, survivors.end - 1),
                        offset_before: 0.0,
                    });
                Some(ViewportAnchor::from_metrics(metrics).with_item(item))
            }
        }
    }

    fn complete(
        this: &Rc<RefCell<Self>>,
        ticket: FetchTicket<S::Cursor>,
        result: Result<Page<S::Item, S::Cursor>, S::Error>,
    ) -> Vec<Rc<dyn Fn()>> {
        let mut inner = this.borrow_mut();
        inner.tasks.retain(|(id, _)| *id != ticket.id());
        if !inner.coordinator.accepts(&ticket) {
            log::debug!("fetch #{} no longer wanted, result dropped", ticket.id());
            return Vec::new();
        }
        match result {
            Ok(page) if ticket.is_initial() => {
                inner.coordinator.finish(&ticket, false);
                inner.commit_seed(page, ticket.cursor().cloned());
            }
            Ok(page) => inner.commit_edge(&ticket, page),
            Err(err) => inner.fail(&ticket, &err),
        }
        inner.callbacks()
    }

    fn commit_seed(&mut self, page: Page<S::Item, S::Cursor>, param: Option<S::Cursor>) {
        self.store.seed(page, param);
        self.adapter.set_item_count(self.store.item_count());
        self.status = ListStatus::Ready;
        self.errors = [None, None];
        self.resubscribe = true;
        log::debug!(
            "initial page committed: {} items, next {:?}, previous {:?}",
            self.store.item_count(),
            self.store.current_forward_cursor(),
            self.store.current_backward_cursor()
        );
        if self.host.is_none() {
            return;
        }
        let shape = self.shape();
        let mut held: SmallVec<[FetchDirection; 2]> = SmallVec::new();
        for direction in FetchDirection::ALL {
            if shape.loads(direction) && self.coordinator.hold(direction) {
                held.push(direction);
            }
        }
        self.compensator.arm_initial(held);
    }

    fn commit_edge(&mut self, ticket: &FetchTicket<S::Cursor>, page: Page<S::Item, S::Cursor>) {
        let direction = ticket.direction();
        if !self.coordinator.is_current(ticket, &self.store) {
            log::debug!(
                "{direction} page for {:?} arrived after the edge moved, discarded",
                ticket.cursor()
            );
            self.compensator.discard(direction);
            self.coordinator.finish(ticket, false);
            return;
        }

        let items = page.len();
        let evicting = self.store.eviction_preview(direction).unwrap_or(0);
        let intent = if self.grows_top(direction) {
            ScrollIntent::Prepended {
                items,
                evicted_bottom: evicting,
            }
        } else {
            ScrollIntent::Appended {
                items,
                evicted_top: evicting,
            }
        };
        // Only the first commit since the last frame still matches the layout on
        // screen; later ones are folded into its anchor by index shift.
        let live = if self.compensator.is_pending() {
            None
        } else {
            self.sample_anchor(self.survivors(intent))
        };

        if let Err(violation) = self.store.insert(direction, page) {
            report_violation(&violation);
            self.compensator.discard(direction);
            self.coordinator.finish(ticket, false);
            return;
        }
        self.adapter.set_item_count(self.store.item_count());

        let compensating = if self.host.is_some() {
            match self.compensator.arm(direction, intent, live) {
                Ok(()) => true,
                Err(violation) => {
                    report_violation(&violation);
                    false
                }
            }
        } else {
            self.compensator.discard(direction);
            false
        };
        self.coordinator.finish(ticket, compensating);
        log::debug!(
            "{direction} page committed ({items} items, {evicting} evicted), {} pages retained",
            self.store.page_count()
        );
    }

    fn fail(&mut self, ticket: &FetchTicket<S::Cursor>, err: &S::Error) {
        let direction = ticket.direction();
        self.coordinator.finish(ticket, false);
        let message = err.to_string();
        if ticket.is_initial() {
            log::warn!("initial fetch failed: {message}");
            self.status = ListStatus::Error(message);
        } else {
            log::warn!("{direction} fetch failed: {message}");
            self.compensator.discard(direction);
            if let Some(edge) = self.shape().edge_for(direction).filter(|_| self.config.virtualized) {
                // Rendered rows keep reporting the edge; wait for it to be left.
                self.adapter.latch(edge);
            }
            self.errors[direction.slot()] = Some(PagingError::FetchFailed { direction, message });
        }
    }

    fn desired_sentinels(&self) -> SentinelSet {
        if self.store.is_empty() {
            return SentinelSet::default();
        }
        let shape = self.shape();
        let present = |edge| {
            shape
                .direction_for(edge)
                .is_some_and(|direction| !self.store.is_terminal(direction))
        };
        SentinelSet::new(present(Edge::Top), present(Edge::Bottom))
    }

    fn poll_sensor(&mut self, metrics: ViewportMetrics) -> SmallVec<[Edge; 2]> {
        let desired = self.desired_sentinels();
        if desired.is_empty() {
            self.observation = None;
            self.resubscribe = false;
            return SmallVec::new();
        }
        let current = self.observation.as_ref().map(Observation::sentinels);
        if self.resubscribe || current != Some(desired) {
            // Disconnect first: never two observations at once.
            self.observation = None;
            match self.sensor.observe(desired, metrics) {
                Ok(observation) => {
                    if self.sensor_error.take().is_some() {
                        log::info!("sentinel observation restored, auto-fetch enabled");
                    }
                    self.observation = Some(observation);
                    self.resubscribe = false;
                }
                Err(err) => {
                    if self.sensor_error.as_ref() != Some(&err) {
                        log::warn!("{}; only manual triggers will load", PagingError::from(err.clone()));
                    }
                    self.sensor_error = Some(err);
                    return SmallVec::new();
                }
            }
        }
        self.observation
            .as_mut()
            .map(|observation| observation.poll(&metrics))
            .unwrap_or_default()
    }

    fn run_frame(&mut self) -> SmallVec<[FetchDirection; 2]> {
        let mut wanted = SmallVec::new();
        if self.coordinator.is_torn_down() {
            return wanted;
        }
        let Some(host) = self.host.clone() else {
            return wanted;
        };

        if let ViewportHost::Virtual(engine) = &host {
            let rows = self.adapter.row_count();
            if self.synced_rows != Some(rows) {
                self.adapter.sync(&mut *engine.borrow_mut(), self.config.overscan);
                self.synced_rows = Some(rows);
            }
        }

        if self.compensator.is_pending() {
            let item_count = self.store.item_count();
            let settlement = match &host {
                ViewportHost::Dom(viewport) => {
                    self.compensator.settle_dom(&*viewport.borrow(), item_count)
                }
                ViewportHost::Virtual(_) => self
                    .compensator
                    .settle_virtual(self.adapter.top_rows(), item_count),
            };
            if let Some(command) = settlement.command {
                log::debug!("compensating scroll: {command:?}");
                host.apply(command);
            }
            for direction in settlement.released {
                if let Err(violation) = self.coordinator.settled(direction) {
                    report_violation(&violation);
                }
            }
            self.resubscribe = true;
        }

        let edges = match &host {
            ViewportHost::Dom(viewport) => {
                let metrics = viewport.borrow().metrics();
                self.poll_sensor(metrics)
            }
            ViewportHost::Virtual(engine) => engine
                .borrow()
                .rendered_range()
                .map(|range| self.adapter.edge_events(&range))
                .unwrap_or_default(),
        };
        let shape = self.shape();
        wanted.extend(edges.into_iter().filter_map(|edge| shape.direction_for(edge)));
        wanted
    }

    fn reset_window(&mut self) -> Vec<(u64, TaskHandle)> {
        self.coordinator.reset();
        self.compensator.clear();
        self.store.clear();
        self.adapter.set_item_count(0);
        self.adapter.unlatch_all();
        self.observation = None;
        self.errors = [None, None];
        std::mem::take(&mut self.tasks)
    }
}

/// Pagination controller shared by every list variant.
pub struct InfiniteListController<S: PageSource> {
    inner: Rc<RefCell<ControllerInner<S>>>,
    source: Rc<S>,
    runtime: RuntimeHandle,
}

impl<S: PageSource> Clone for InfiniteListController<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            source: Rc::clone(&self.source),
            runtime: self.runtime.clone(),
        }
    }
}

impl<S: PageSource> InfiniteListController<S> {
    pub fn new(
        source: S,
        config: InfiniteListConfig<S::Cursor>,
        runtime: RuntimeHandle,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            inner: Rc::new(RefCell::new(ControllerInner::new(config))),
            source: Rc::new(source),
            runtime,
        })
    }

    pub fn shape(&self) -> ListShape {
        self.inner.borrow().config.shape
    }

    pub fn is_virtualized(&self) -> bool {
        self.inner.borrow().config.virtualized
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Connects the viewport or virtualization engine the list renders into.
    pub fn attach(&self, host: ViewportHost) -> Result<(), ConfigError> {
        let mut inner = self.inner.borrow_mut();
        let virtualized = inner.config.virtualized;
        if host.is_virtual() != virtualized {
            return Err(ConfigError::HostMismatch { virtualized });
        }
        log::debug!("attached to {host:?}");
        inner.observation = None;
        inner.sensor_error = None;
        inner.synced_rows = None;
        inner.host = Some(host);
        Ok(())
    }

    pub fn detach(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.observation = None;
        inner.host = None;
    }

    /// Fetches the first page with the configured initial cursor. Any pages
    /// already loaded are dropped.
    pub fn load_initial(&self) -> Result<(), TriggerSkipped> {
        if !self.runtime.is_alive() {
            return Err(TriggerSkipped::TornDown);
        }
        let (ticket, stale) = {
            let mut inner = self.inner.borrow_mut();
            if inner.coordinator.is_torn_down() {
                return Err(TriggerSkipped::TornDown);
            }
            if inner.coordinator.is_loading_initial() {
                return Err(TriggerSkipped::InFlight);
            }
            let stale = inner.reset_window();
            let cursor = inner.config.initial_cursor.clone();
            let ticket = inner.coordinator.begin_initial(cursor)?;
            inner.status = ListStatus::Loading;
            (ticket, stale)
        };
        for (_, task) in stale {
            task.cancel();
        }
        self.spawn_fetch(ticket);
        Ok(())
    }

    /// Seeds the list with a page fetched elsewhere instead of fetching one.
    pub fn hydrate(&self, page: Page<S::Item, S::Cursor>) -> Result<(), TriggerSkipped> {
        let (stale, callbacks) = {
            let mut inner = self.inner.borrow_mut();
            if inner.coordinator.is_torn_down() {
                return Err(TriggerSkipped::TornDown);
            }
            let stale = inner.reset_window();
            let param = inner.config.initial_cursor.clone();
            inner.commit_seed(page, param);
            (stale, inner.callbacks())
        };
        for (_, task) in stale {
            task.cancel();
        }
        for callback in callbacks {
            callback();
        }
        Ok(())
    }

    pub fn trigger_next(&self) -> Result<(), TriggerSkipped> {
        self.trigger(FetchDirection::Forward)
    }

    pub fn trigger_previous(&self) -> Result<(), TriggerSkipped> {
        self.trigger(FetchDirection::Backward)
    }

    /// Requests a page in `direction`, gated exactly like a sentinel trigger.
    pub fn trigger(&self, direction: FetchDirection) -> Result<(), TriggerSkipped> {
        self.runtime.assert_ui_thread();
        if !self.runtime.is_alive() {
            return Err(TriggerSkipped::TornDown);
        }
        let ticket = {
            let mut guard = self.inner.borrow_mut();
            let inner = &mut *guard;
            let ticket = inner
                .coordinator
                .begin(direction, inner.config.shape, &inner.store)?;
            inner.errors[direction.slot()] = None;
            if let Some(edge) = inner.config.shape.edge_for(direction) {
                inner.adapter.unlatch(edge);
            }
            if inner.grows_top(direction) {
                let survivors = 0..inner.store.item_count();
                if let Some(anchor) = inner.sample_anchor(survivors) {
                    inner.compensator.capture(direction, anchor);
                }
            }
            ticket
        };
        self.spawn_fetch(ticket);
        Ok(())
    }

    fn spawn_fetch(&self, ticket: FetchTicket<S::Cursor>) {
        let fetch = self.source.fetch_page(ticket.direction(), ticket.cursor());
        let fallback = ticket.clone();
        let ticket_id = ticket.id();
        let weak = Rc::downgrade(&self.inner);
        let runtime = self.runtime.clone();
        let task = self.runtime.spawn_ui(async move {
            let result = fetch.await;
            let Some(inner) = weak.upgrade() else {
                log::trace!("fetch #{ticket_id} settled after its controller was dropped");
                return;
            };
            let callbacks = ControllerInner::complete(&inner, ticket, result);
            drop(inner);
            runtime.schedule();
            for callback in callbacks {
                callback();
            }
        });
        let mut inner = self.inner.borrow_mut();
        match task {
            Some(task) => inner.tasks.push((ticket_id, task)),
            None => {
                log::warn!("runtime is gone, fetch #{ticket_id} abandoned");
                inner.coordinator.finish(&fallback, false);
                inner.compensator.discard(fallback.direction());
            }
        }
    }

    /// Per-frame work, called by the host after layout: apply the pending scroll
    /// write, refresh edge detection, then fetch for every edge that was reached.
    pub fn frame(&self) {
        let wanted = self.inner.borrow_mut().run_frame();
        for direction in wanted {
            match self.trigger(direction) {
                Ok(()) => log::debug!("{direction} edge reached, fetching"),
                Err(reason) => log::trace!("{direction} edge reached, skipped: {reason}"),
            }
        }
    }

    /// Tears the controller down: observation released, in-flight fetches
    /// cancelled, later completions ignored.
    pub fn dispose(&self) {
        let tasks = {
            let mut inner = self.inner.borrow_mut();
            inner.coordinator.tear_down();
            inner.observation = None;
            inner.compensator.clear();
            inner.host = None;
            inner.invalidate_callbacks.clear();
            std::mem::take(&mut inner.tasks)
        };
        for (_, task) in tasks {
            task.cancel();
        }
        log::debug!("infinite list controller disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.borrow().coordinator.is_torn_down()
    }

    pub fn has_next(&self) -> bool {
        self.inner.borrow().store.current_forward_cursor().is_some()
    }

    pub fn has_previous(&self) -> bool {
        let inner = self.inner.borrow();
        inner.shape().loads(FetchDirection::Backward)
            && inner.store.current_backward_cursor().is_some()
    }

    pub fn is_fetching_next(&self) -> bool {
        self.inner.borrow().coordinator.is_in_flight(FetchDirection::Forward)
    }

    pub fn is_fetching_previous(&self) -> bool {
        self.inner.borrow().coordinator.is_in_flight(FetchDirection::Backward)
    }

    pub fn is_loading_initial(&self) -> bool {
        self.inner.borrow().coordinator.is_loading_initial()
    }

    pub fn edge_state(&self, direction: FetchDirection) -> EdgeState {
        self.inner.borrow().coordinator.state(direction)
    }

    pub fn has_pending_compensation(&self) -> bool {
        self.inner.borrow().compensator.is_pending()
    }

    pub fn status(&self) -> ListStatus {
        self.inner.borrow().status.clone()
    }

    /// Last failure in `direction`, cleared by the next trigger there.
    pub fn last_error(&self, direction: FetchDirection) -> Option<PagingError> {
        self.inner.borrow().errors[direction.slot()].clone()
    }

    /// Why automatic edge detection is off, if it is.
    pub fn sensor_error(&self) -> Option<SensorError> {
        self.inner.borrow().sensor_error.clone()
    }

    pub fn item_count(&self) -> usize {
        self.inner.borrow().store.item_count()
    }

    pub fn page_count(&self) -> usize {
        self.inner.borrow().store.page_count()
    }

    /// Cursor each retained page was fetched with, backward-most first.
    pub fn page_params(&self) -> Vec<Option<S::Cursor>> {
        self.inner
            .borrow()
            .store
            .page_params()
            .into_iter()
            .map(|param| param.cloned())
            .collect()
    }

    /// Visits items in display order.
    pub fn visit_items(&self, mut f: impl FnMut(usize, &S::Item)) {
        let inner = self.inner.borrow();
        if inner.shape().is_reversed() {
            inner.store.items().rev().enumerate().for_each(|(i, item)| f(i, item));
        } else {
            inner.store.items().enumerate().for_each(|(i, item)| f(i, item));
        }
    }

    /// Item at display index `index`.
    pub fn item(&self, index: usize) -> Option<S::Item>
    where
        S::Item: Clone,
    {
        let inner = self.inner.borrow();
        let data_index = if inner.shape().is_reversed() {
            inner.store.item_count().checked_sub(index + 1)?
        } else {
            index
        };
        inner.store.item(data_index).cloned()
    }

    /// Items in display order.
    pub fn items(&self) -> Vec<S::Item>
    where
        S::Item: Clone,
    {
        let mut items = Vec::with_capacity(self.item_count());
        self.visit_items(|_, item| items.push(item.clone()));
        items
    }

    /// Registers a callback run after every commit.
    pub fn add_invalidate_callback(&self, callback: Rc<dyn Fn()>) -> u64 {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_callback_id;
        inner.next_callback_id += 1;
        inner.invalidate_callbacks.push((id, callback));
        id
    }

    pub fn remove_invalidate_callback(&self, id: u64) {
        self.inner
            .borrow_mut()
            .invalidate_callbacks
            .retain(|(callback_id, _)| *callback_id != id);
    }
}
