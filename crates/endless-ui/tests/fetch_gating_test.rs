//! Which fetches are allowed to start, and what happens to the ones that end badly.

use endless_foundation::paging::{
    Edge, EdgeState, FetchDirection, InfiniteListConfig, ListStatus, PagingError, SensorError,
    TriggerSkipped,
};
use endless_testing::{FetchCall, InfiniteListTestRule, NumberFeed, ScriptedPageSource};
use endless_ui::ListRow;

/// Rows short enough that the bottom sentinel stays on screen.
fn short_rows(config: InfiniteListConfig<i64>, source: ScriptedPageSource) -> InfiniteListTestRule {
    InfiniteListTestRule::with_source(source, config, 300.0)
        .expect("valid config")
        .with_row_height(|_| 10.0)
}

#[test]
fn never_more_than_one_fetch_per_direction() {
    let source = ScriptedPageSource::new(NumberFeed::default()).deferred();
    let mut rule = short_rows(InfiniteListConfig::forward(), source);
    rule.mount();
    rule.source().resolve(FetchDirection::Forward);
    rule.pump();
    assert!(rule.controller().is_fetching_next());

    for _ in 0..5 {
        rule.pump();
    }
    assert_eq!(
        rule.controller().trigger_next(),
        Err(TriggerSkipped::InFlight)
    );
    assert_eq!(
        rule.list().load_more(Edge::Bottom),
        Err(TriggerSkipped::InFlight)
    );
    // Initial fetch plus one forward page.
    assert_eq!(rule.source().calls_in(FetchDirection::Forward), 2);
    assert_eq!(rule.source().pending_count(), 1);

    rule.source().resolve(FetchDirection::Forward);
    rule.pump();
    assert_eq!(rule.controller().item_count(), 20);
    // Still short: the sentinel is back on screen once the commit settled.
    assert_eq!(rule.source().calls_in(FetchDirection::Forward), 3);
    assert_eq!(rule.source().pending_count(), 1);
}

#[test]
fn forward_list_stops_at_the_last_page() {
    let mut rule = short_rows(
        InfiniteListConfig::forward(),
        ScriptedPageSource::new(NumberFeed::default()),
    );
    rule.mount();
    assert!(rule.wait_for_idle());

    assert_eq!(rule.controller().page_count(), 5);
    assert_eq!(rule.controller().item_count(), 50);
    assert!(!rule.controller().has_next());
    assert_eq!(rule.source().call_count(), 5);

    for _ in 0..3 {
        rule.pump();
    }
    assert_eq!(rule.source().call_count(), 5);
    assert_eq!(
        rule.controller().trigger_next(),
        Err(TriggerSkipped::Terminal)
    );
    assert_eq!(rule.list().loader_text(Edge::Bottom), Some("end"));
}

#[test]
fn bidirectional_fetches_use_the_edge_cursors() {
    let mut rule = InfiniteListTestRule::new(
        InfiniteListConfig::bidirectional().with_initial_cursor(0),
        300.0,
    )
    .expect("valid config")
    .with_row_height(|_| 1.0);
    rule.mount();
    assert!(rule.wait_for_idle());

    // Everything fits on screen, so both directions run to their ends.
    assert_eq!(rule.controller().page_count(), 9);
    assert!(!rule.controller().has_next());
    assert!(!rule.controller().has_previous());
    assert_eq!(rule.controller().items(), (-40..50).collect::<Vec<_>>());

    let calls = rule.source().calls();
    assert_eq!(
        calls[0],
        FetchCall {
            direction: FetchDirection::Forward,
            cursor: Some(0),
        }
    );
    let forward: Vec<_> = calls[1..]
        .iter()
        .filter(|call| call.direction == FetchDirection::Forward)
        .map(|call| call.cursor)
        .collect();
    let backward: Vec<_> = calls
        .iter()
        .filter(|call| call.direction == FetchDirection::Backward)
        .map(|call| call.cursor)
        .collect();
    assert_eq!(forward, vec![Some(1), Some(2), Some(3), Some(4)]);
    assert_eq!(backward, vec![Some(-1), Some(-2), Some(-3), Some(-4)]);
}

#[test]
fn page_cap_moves_the_opposite_cursor() {
    let rule = InfiniteListTestRule::new(
        InfiniteListConfig::bidirectional()
            .with_initial_cursor(0)
            .with_max_pages(3),
        300.0,
    )
    .expect("valid config");
    let controller = rule.controller().clone();
    let drain = || rule.runtime().handle().drain_ui();

    controller.load_initial().expect("initial load starts");
    drain();
    for _ in 0..3 {
        controller.trigger_next().expect("forward fetch starts");
        drain();
    }

    assert_eq!(controller.page_count(), 3);
    assert_eq!(controller.page_params(), vec![Some(1), Some(2), Some(3)]);
    assert_eq!(controller.items(), (10..40).collect::<Vec<_>>());
    assert!(controller.has_previous(), "evicted page is reachable again");

    controller.trigger_previous().expect("backward fetch starts");
    assert_eq!(
        rule.source().calls().last(),
        Some(&FetchCall {
            direction: FetchDirection::Backward,
            cursor: Some(0),
        })
    );
    drain();
    assert_eq!(controller.page_params(), vec![Some(0), Some(1), Some(2)]);
    assert!(controller.has_next());
    controller.trigger_next().expect("forward fetch starts");
    assert_eq!(
        rule.source().calls().last(),
        Some(&FetchCall {
            direction: FetchDirection::Forward,
            cursor: Some(3),
        })
    );
}

#[test]
fn failed_fetch_returns_to_idle_and_can_be_retried() {
    let source = ScriptedPageSource::new(NumberFeed::default()).deferred();
    let mut rule = short_rows(InfiniteListConfig::forward(), source);
    rule.mount();
    rule.source().resolve(FetchDirection::Forward);
    rule.pump();

    rule.source()
        .reject(FetchDirection::Forward, "socket closed")
        .expect("forward fetch pending");
    rule.pump();

    let controller = rule.controller();
    assert_eq!(controller.edge_state(FetchDirection::Forward), EdgeState::Idle);
    assert_eq!(controller.item_count(), 10);
    assert_eq!(
        controller.last_error(FetchDirection::Forward),
        Some(PagingError::FetchFailed {
            direction: FetchDirection::Forward,
            message: "socket closed".into(),
        })
    );

    // No automatic retry while the sentinel just sits there.
    rule.pump();
    assert_eq!(rule.source().calls_in(FetchDirection::Forward), 2);

    rule.list().load_more(Edge::Bottom).expect("retry starts");
    assert_eq!(rule.controller().last_error(FetchDirection::Forward), None);
    rule.source().resolve(FetchDirection::Forward);
    rule.pump();
    assert_eq!(rule.controller().item_count(), 20);
}

#[test]
fn failed_initial_fetch_shows_the_error() {
    let mut rule = InfiniteListTestRule::new(InfiniteListConfig::forward(), 300.0)
        .expect("valid config");
    rule.source().fail_next("offline");
    rule.mount();
    rule.pump();

    assert_eq!(
        rule.controller().status(),
        ListStatus::Error("offline".into())
    );
    assert_eq!(
        rule.list().rows(),
        vec![ListRow::Status("Error offline".to_string())]
    );
    assert_eq!(
        rule.controller().trigger_next(),
        Err(TriggerSkipped::NotLoaded)
    );

    rule.controller().load_initial().expect("retry starts");
    assert!(rule.wait_for_idle());
    assert_eq!(rule.controller().status(), ListStatus::Ready);
    assert_eq!(rule.controller().item_count(), 10);
}

#[test]
fn unusable_viewport_leaves_manual_loading() {
    let mut rule = InfiniteListTestRule::new(InfiniteListConfig::forward(), 0.0)
        .expect("valid config")
        .with_row_height(|_| 10.0);
    rule.mount();
    rule.pump();
    rule.pump();

    assert_eq!(
        rule.controller().sensor_error(),
        Some(SensorError::EmptyViewport { client_height: 0.0 })
    );
    assert_eq!(rule.source().call_count(), 1);

    rule.controller().trigger_next().expect("manual fetch starts");
    assert_eq!(rule.source().call_count(), 2);

    rule.viewport().borrow_mut().set_client_height(300.0);
    rule.pump();
    assert_eq!(rule.controller().sensor_error(), None);
    assert_eq!(rule.controller().item_count(), 20);
    assert_eq!(rule.source().call_count(), 3);
}

#[test]
fn completion_after_unmount_is_ignored() {
    let source = ScriptedPageSource::new(NumberFeed::default()).deferred();
    let mut rule = InfiniteListTestRule::with_source(source, InfiniteListConfig::forward(), 300.0)
        .expect("valid config")
        .with_row_height(|_| 100.0);
    rule.mount();
    rule.source().resolve(FetchDirection::Forward);
    rule.pump();
    rule.controller().trigger_next().expect("forward fetch starts");
    assert_eq!(rule.runtime().handle().active_task_count(), 1);

    rule.unmount();
    assert!(rule.controller().is_disposed());
    assert_eq!(rule.runtime().handle().active_task_count(), 0);

    rule.source()
        .resolve(FetchDirection::Forward)
        .expect("source still holds the request");
    rule.pump();
    assert_eq!(rule.controller().item_count(), 10);
    assert_eq!(
        rule.controller().trigger_next(),
        Err(TriggerSkipped::TornDown)
    );
}

#[test]
fn hydrated_list_skips_the_first_fetch() {
    let mut rule = InfiniteListTestRule::new(
        InfiniteListConfig::bidirectional().with_initial_cursor(0),
        300.0,
    )
    .expect("valid config")
    .with_row_height(|_| 100.0);
    rule.mount_hydrated(NumberFeed::default().page(0));
    assert!(rule.wait_for_idle());

    // Hydration scrolls to the bottom like a fetched first page, which then loads page 1.
    let calls = rule.source().calls();
    assert_eq!(
        calls.first(),
        Some(&FetchCall {
            direction: FetchDirection::Forward,
            cursor: Some(1),
        })
    );
    assert_eq!(rule.controller().item_count(), 20);
    assert_eq!(rule.scroll_top(), 700.0);
}
