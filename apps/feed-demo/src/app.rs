//! Headless walkthrough of every list variant over the number feed.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{bail, Result};
use endless_core::{DefaultScheduler, Runtime};
use endless_foundation::paging::{Edge, InfiniteListConfig, ViewportHost};
use endless_ui::{EdgeMessages, InfiniteList, ListRow};

use crate::feed::NumberFeed;
use crate::host::{FeedViewport, FeedVirtualizer};

const CLIENT_HEIGHT: f32 = 300.0;
const ROW_HEIGHT: f32 = 50.0;
const LOADER_HEIGHT: f32 = 24.0;
const SCROLL_ROUNDS: usize = 5;
const MAX_FRAMES: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Demo {
    Forward,
    Reverse,
    Bidirectional,
    VirtualForward,
    VirtualBidirectional,
}

/// What a demo ended up showing.
#[derive(Debug)]
pub struct DemoReport {
    pub demo: Demo,
    pub items: usize,
    pub pages: usize,
    pub scroll_top: f32,
    pub first_row: String,
    pub last_row: String,
}

impl Demo {
    pub const ALL: [Demo; 5] = [
        Demo::Forward,
        Demo::Reverse,
        Demo::Bidirectional,
        Demo::VirtualForward,
        Demo::VirtualBidirectional,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Demo::Forward => "Infinite List",
            Demo::Reverse => "Reverse Infinite List",
            Demo::Bidirectional => "Bidirectional Infinite List",
            Demo::VirtualForward => "Virtual Infinite List",
            Demo::VirtualBidirectional => "Virtual Bidirectional Infinite List",
        }
    }

    fn config(self) -> InfiniteListConfig<i64> {
        match self {
            Demo::Forward => InfiniteListConfig::forward(),
            Demo::Reverse => InfiniteListConfig::reverse(),
            Demo::Bidirectional => InfiniteListConfig::bidirectional().with_initial_cursor(0),
            Demo::VirtualForward => InfiniteListConfig::forward().virtualized().with_overscan(2),
            Demo::VirtualBidirectional => InfiniteListConfig::bidirectional()
                .with_initial_cursor(0)
                .virtualized()
                .with_overscan(2),
        }
    }

    /// Edges the walkthrough scrolls to, in order, each round.
    fn edges(self) -> &'static [Edge] {
        match self {
            Demo::Forward | Demo::VirtualForward => &[Edge::Bottom],
            Demo::Reverse => &[Edge::Top],
            Demo::Bidirectional | Demo::VirtualBidirectional => &[Edge::Top, Edge::Bottom],
        }
    }

    fn session(self) -> Result<Session> {
        let runtime = Runtime::new(Arc::new(DefaultScheduler));
        let mut list = InfiniteList::new(NumberFeed::default(), self.config(), runtime.handle())?;
        let host = match self {
            Demo::VirtualForward | Demo::VirtualBidirectional => {
                Host::Virtual(Rc::new(RefCell::new(FeedVirtualizer::new(ROW_HEIGHT, CLIENT_HEIGHT))))
            }
            _ => Host::Plain(Rc::new(RefCell::new(FeedViewport::new(
                CLIENT_HEIGHT,
                ROW_HEIGHT,
                LOADER_HEIGHT,
            )))),
        };
        match self {
            Demo::VirtualForward => list.set_edge_messages(
                Edge::Bottom,
                EdgeMessages::new("Loading more...", "Nothing more to load"),
            ),
            Demo::VirtualBidirectional => {
                list.set_edge_messages(
                    Edge::Top,
                    EdgeMessages::new("Loading previous page...", "No more previous page"),
                );
                list.set_edge_messages(
                    Edge::Bottom,
                    EdgeMessages::new("Loading next page...", "No more next page"),
                );
            }
            _ => {}
        }
        list.mount(host.to_view())?;
        Ok(Session {
            demo: self,
            list,
            host,
            runtime,
        })
    }

    pub fn run(self) -> Result<DemoReport> {
        log::info!("=== {} ===", self.title());
        let mut session = self.session()?;
        session.settle()?;

        for round in 1..=SCROLL_ROUNDS {
            for &edge in self.edges() {
                session.scroll_to(edge);
                session.settle()?;
                let controller = session.list.controller();
                log::info!(
                    "round {round}, {edge}: {} items in {} pages, scroll_top {}, {} fetches",
                    controller.item_count(),
                    controller.page_count(),
                    session.scroll_top(),
                    controller.source().fetches()
                );
            }
        }

        let rows = session.list.rows();
        let controller = session.list.controller();
        Ok(DemoReport {
            demo: self,
            items: controller.item_count(),
            pages: controller.page_count(),
            scroll_top: session.scroll_top(),
            first_row: rows.first().map(describe).unwrap_or_default(),
            last_row: rows.last().map(describe).unwrap_or_default(),
        })
    }
}

enum Host {
    Plain(Rc<RefCell<FeedViewport>>),
    Virtual(Rc<RefCell<FeedVirtualizer>>),
}

impl Host {
    fn to_view(&self) -> ViewportHost {
        match self {
            Host::Plain(viewport) => ViewportHost::dom(Rc::clone(viewport)),
            Host::Virtual(engine) => ViewportHost::virtualized(Rc::clone(engine)),
        }
    }
}

/// A mounted list and the host it renders into.
struct Session {
    demo: Demo,
    list: InfiniteList<NumberFeed>,
    host: Host,
    // Dropped last so the list can still cancel its tasks.
    runtime: Runtime,
}

impl Session {
    /// One frame: commit finished fetches, lay out, run the list's frame hook.
    fn frame(&mut self) {
        self.runtime.handle().drain_ui();
        if let Host::Plain(viewport) = &self.host {
            viewport.borrow_mut().layout(&self.list.rows());
        }
        self.list.frame();
    }

    fn is_busy(&self) -> bool {
        let controller = self.list.controller();
        self.runtime.handle().has_pending_ui()
            || controller.has_pending_compensation()
            || controller.is_loading_initial()
            || controller.is_fetching_next()
            || controller.is_fetching_previous()
    }

    /// Runs frames until one changes nothing.
    fn settle(&mut self) -> Result<()> {
        let mut previous = None;
        for _ in 0..MAX_FRAMES {
            self.frame();
            let controller = self.list.controller();
            let snapshot = (controller.item_count(), controller.source().fetches(), self.scroll_top());
            if !self.is_busy() && previous == Some(snapshot) {
                if let Some(text) = self.list.status_text() {
                    bail!("{}: {text}", self.demo.title());
                }
                return Ok(());
            }
            previous = Some(snapshot);
        }
        bail!("{} did not settle after {MAX_FRAMES} frames", self.demo.title())
    }

    fn scroll_to(&mut self, edge: Edge) {
        let offset = match edge {
            Edge::Top => 0.0,
            Edge::Bottom => f32::MAX,
        };
        match &self.host {
            Host::Plain(viewport) => viewport.borrow_mut().scroll_to(offset),
            Host::Virtual(engine) => engine.borrow_mut().scroll_to(offset),
        }
    }

    fn scroll_top(&self) -> f32 {
        match &self.host {
            Host::Plain(viewport) => viewport.borrow().scroll_top(),
            Host::Virtual(engine) => engine.borrow().offset(),
        }
    }
}

fn describe(row: &ListRow<i64>) -> String {
    match row {
        ListRow::Status(text) => text.clone(),
        ListRow::Loader { text, .. } => format!("[{text}]"),
        ListRow::Item { item, .. } => format!("Item {item}"),
    }
}
