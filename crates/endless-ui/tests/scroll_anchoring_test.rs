//! Scroll position across page commits on plain viewports.
//!
//! Rows for non-negative items are 100px and rows for negative items are 40px,
//! so content loaded above the viewport has a different height than what was
//! there before and any missing compensation shows up as a wrong offset.

use endless_foundation::paging::{EdgeState, FetchDirection, InfiniteListConfig, ScrollViewport};
use endless_testing::{InfiniteListTestRule, NumberFeed, ScriptedPageSource};

fn mixed_height(item: &i64) -> f32 {
    if *item < 0 {
        40.0
    } else {
        100.0
    }
}

fn deferred_bidirectional() -> InfiniteListTestRule {
    let source = ScriptedPageSource::new(NumberFeed::default()).deferred();
    let config = InfiniteListConfig::bidirectional().with_initial_cursor(0);
    InfiniteListTestRule::with_source(source, config, 300.0)
        .expect("valid config")
        .with_row_height(mixed_height)
}

#[test]
fn initial_page_scrolls_to_bottom_and_exposes_both_edges() {
    let mut rule = deferred_bidirectional();
    rule.mount();
    rule.source()
        .resolve(FetchDirection::Forward)
        .expect("initial fetch pending");
    rule.pump();

    assert_eq!(rule.controller().item_count(), 10);
    assert_eq!(rule.scroll_top(), 700.0);
    assert!(rule.controller().has_next());
    assert!(rule.controller().has_previous());
    // The bottom sentinel is on screen after the initial scroll.
    assert!(rule.controller().is_fetching_next());
    assert!(!rule.controller().is_fetching_previous());
}

#[test]
fn prepend_keeps_the_visible_item_in_place() {
    let mut rule = deferred_bidirectional();
    rule.mount();
    rule.source().resolve(FetchDirection::Forward);
    rule.pump();

    rule.scroll_to_top();
    rule.pump();
    assert!(rule.controller().is_fetching_previous());
    assert_eq!(rule.first_visible_item(), Some(0));

    rule.source()
        .resolve(FetchDirection::Backward)
        .expect("backward fetch pending");
    rule.pump();

    // Ten 40px rows landed above: 0 + (1400 - 1000).
    assert_eq!(rule.scroll_top(), 400.0);
    assert_eq!(rule.scroll_height(), 1400.0);
    assert_eq!(rule.first_visible_item(), Some(0));
    assert_eq!(
        rule.controller().edge_state(FetchDirection::Backward),
        EdgeState::Idle
    );

    // The forward page that was still in flight appends below without moving anything.
    rule.source()
        .resolve(FetchDirection::Forward)
        .expect("forward fetch pending");
    rule.pump();
    assert_eq!(rule.controller().item_count(), 30);
    assert_eq!(rule.scroll_top(), 400.0);
    assert_eq!(rule.first_visible_item(), Some(0));
}

#[test]
fn forward_commit_while_backward_in_flight_does_not_break_anchoring() {
    let mut rule = deferred_bidirectional();
    rule.mount();
    rule.source().resolve(FetchDirection::Forward);
    rule.pump();
    rule.scroll_to_top();
    rule.pump();
    assert!(rule.controller().is_fetching_next());
    assert!(rule.controller().is_fetching_previous());

    rule.source().resolve(FetchDirection::Forward);
    rule.pump();
    assert_eq!(rule.controller().item_count(), 20);
    assert_eq!(rule.scroll_top(), 0.0);
    // The top sentinel fired again but the backward fetch is still running.
    assert_eq!(rule.source().calls_in(FetchDirection::Backward), 1);

    rule.source().resolve(FetchDirection::Backward);
    rule.pump();
    assert_eq!(rule.scroll_top(), 400.0);
    assert_eq!(rule.first_visible_item(), Some(0));
    assert_eq!(rule.controller().item_count(), 30);
}

#[test]
fn trigger_between_commit_and_frame_waits_for_compensation() {
    let mut rule = deferred_bidirectional();
    rule.mount();
    rule.source().resolve(FetchDirection::Forward);
    rule.pump();
    rule.scroll_to_top();
    rule.pump();

    rule.source().resolve(FetchDirection::Backward);
    rule.runtime().handle().drain_ui();
    assert_eq!(
        rule.controller().edge_state(FetchDirection::Backward),
        EdgeState::CompensationPending
    );
    assert!(rule.controller().has_pending_compensation());
    assert!(rule.controller().trigger_previous().is_err());
    assert_eq!(rule.source().calls_in(FetchDirection::Backward), 1);

    rule.layout();
    rule.list().frame();
    assert_eq!(
        rule.controller().edge_state(FetchDirection::Backward),
        EdgeState::Idle
    );
    assert_eq!(rule.scroll_top(), 400.0);
}

#[test]
fn append_and_prepend_in_one_frame_keep_the_visible_items() {
    let mut rule = deferred_bidirectional();
    rule.mount();
    rule.source().resolve(FetchDirection::Forward);
    rule.pump();
    rule.scroll_to_top();
    rule.pump();
    assert!(rule.controller().is_fetching_next());
    assert!(rule.controller().is_fetching_previous());

    rule.scroll_to(650.0);
    assert_eq!(rule.visible_items(), vec![6, 7, 8, 9]);

    rule.source().resolve(FetchDirection::Forward);
    rule.source().resolve(FetchDirection::Backward);
    rule.pump();

    // Ten 40px rows above and ten 100px rows below: only the rows above count.
    assert_eq!(rule.controller().item_count(), 30);
    assert_eq!(rule.scroll_height(), 2400.0);
    assert_eq!(rule.scroll_top(), 1050.0);
    assert_eq!(rule.visible_items(), vec![6, 7, 8, 9]);
    assert_eq!(
        rule.controller().edge_state(FetchDirection::Forward),
        EdgeState::Idle
    );
    assert_eq!(
        rule.controller().edge_state(FetchDirection::Backward),
        EdgeState::Idle
    );
}

#[test]
fn append_that_evicts_from_the_top_keeps_the_visible_item() {
    let config = InfiniteListConfig::forward()
        .with_initial_cursor(0)
        .with_max_pages(2);
    let mut rule = InfiniteListTestRule::new(config, 300.0)
        .expect("valid config")
        .with_row_height(|_| 100.0);
    rule.mount();
    assert!(rule.wait_for_idle());

    rule.scroll_to_bottom();
    assert!(rule.wait_for_idle());
    assert_eq!(rule.controller().item_count(), 20);
    assert_eq!(rule.scroll_top(), 700.0);

    rule.scroll_to_bottom();
    assert_eq!(rule.first_visible_item(), Some(17));
    assert!(rule.wait_for_idle());

    // Page 0 went away above the viewport; item 17 stays where it was.
    assert_eq!(rule.controller().page_params(), vec![Some(1), Some(2)]);
    assert_eq!(rule.scroll_top(), 700.0);
    assert_eq!(rule.first_visible_item(), Some(17));
    assert!(!rule.controller().has_previous());
}

#[test]
fn reverse_list_keeps_position_when_older_pages_load_above() {
    let config = InfiniteListConfig::reverse().with_initial_cursor(0);
    let mut rule = InfiniteListTestRule::new(config, 300.0)
        .expect("valid config")
        .with_row_height(|_| 100.0);
    rule.mount();
    assert!(rule.wait_for_idle());

    // Newest item at the bottom, list scrolled to it.
    assert_eq!(rule.scroll_top(), 700.0);
    assert_eq!(rule.visible_items(), vec![2, 1, 0]);
    assert!(!rule.controller().is_fetching_next());

    rule.scroll_to_top();
    assert_eq!(rule.first_visible_item(), Some(9));
    assert!(rule.wait_for_idle());

    assert_eq!(rule.controller().item_count(), 20);
    assert_eq!(rule.scroll_top(), 1000.0);
    assert_eq!(rule.first_visible_item(), Some(9));
    assert_eq!(rule.controller().item(0), Some(19));
}

#[test]
fn loader_rows_are_part_of_the_layout() {
    let source = ScriptedPageSource::new(NumberFeed::default()).deferred();
    let config = InfiniteListConfig::bidirectional().with_initial_cursor(0);
    let mut rule = InfiniteListTestRule::with_source(source, config, 300.0)
        .expect("valid config")
        .with_row_height(mixed_height)
        .with_loader_height(50.0);
    rule.mount();
    rule.source().resolve(FetchDirection::Forward);
    rule.pump();
    assert_eq!(rule.scroll_height(), 1100.0);
    assert_eq!(rule.scroll_top(), 800.0);

    rule.scroll_to_top();
    rule.pump();
    rule.source().resolve(FetchDirection::Backward);
    rule.pump();

    assert_eq!(rule.scroll_top(), 400.0);
    assert_eq!(rule.viewport().borrow().item_offset(10), Some(450.0));
}
