use std::sync::Once;

use pretty_assertions::assert_eq;
use threadfeed_core::{
    update, Effect, FeedState, Item, Msg, Phase, RetryPolicy, RowView, StopReason,
};

const PAGE_1: &str = "https://forums.example.com/hot-deals-f9/";
const PAGE_2: &str = "https://forums.example.com/hot-deals-f9/2/";
const PAGE_3: &str = "https://forums.example.com/hot-deals-f9/3/";

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(feed_logging::initialize_for_tests);
}

fn item(id: &str) -> Item {
    Item {
        id: id.to_string(),
        url: format!("/thread-title-{id}/"),
        title: format!("Thread {id}"),
    }
}

fn item_ids(state: &FeedState) -> Vec<String> {
    state.items().map(|item| item.id.clone()).collect()
}

fn loaded(ids: &[&str], next_page: Option<&str>) -> FeedState {
    let (state, _) = update(
        FeedState::new(),
        Msg::InitialPageLoaded {
            url: PAGE_1.to_string(),
            items: ids.iter().map(|id| item(id)).collect(),
            next_page: next_page.map(str::to_string),
        },
    );
    state
}

fn page(state: FeedState, url: &str, ids: &[&str], next_page: Option<&str>) -> (FeedState, Vec<Effect>) {
    update(
        state,
        Msg::PageLoaded {
            url: url.to_string(),
            items: ids.iter().map(|id| item(id)).collect(),
            next_page: next_page.map(str::to_string),
        },
    )
}

#[test]
fn initial_page_arms_trigger_and_looks_up_every_item() {
    init_logging();
    let (mut state, effects) = update(
        FeedState::new(),
        Msg::InitialPageLoaded {
            url: PAGE_1.to_string(),
            items: vec![item("a"), item("b")],
            next_page: Some(PAGE_2.to_string()),
        },
    );

    assert_eq!(
        effects,
        vec![
            Effect::LookupIgnore { id: "a".into() },
            Effect::LookupIgnore { id: "b".into() },
            Effect::ArmTrigger,
        ]
    );
    assert_eq!(state.phase(), Phase::Idle);
    assert_eq!(state.cursor(), Some(PAGE_2));
    assert!(state.consume_dirty());
    assert!(!state.consume_dirty());
}

#[test]
fn second_initial_page_is_ignored() {
    init_logging();
    let state = loaded(&["a"], Some(PAGE_2));
    let (next, effects) = update(
        state.clone(),
        Msg::InitialPageLoaded {
            url: PAGE_1.to_string(),
            items: vec![item("z")],
            next_page: None,
        },
    );
    assert_eq!(next, state);
    assert!(effects.is_empty());
}

#[test]
fn scroll_through_three_pages() {
    init_logging();
    let state = loaded(&["a", "b"], Some(PAGE_2));

    let (state, effects) = update(state, Msg::TriggerFired);
    assert_eq!(
        effects,
        vec![
            Effect::DisarmTrigger,
            Effect::FetchPage {
                url: PAGE_2.to_string()
            },
        ]
    );
    assert_eq!(state.phase(), Phase::FetchInFlight);

    let (state, effects) = page(state, PAGE_2, &["b", "c"], Some(PAGE_3));
    assert_eq!(
        effects,
        vec![Effect::LookupIgnore { id: "c".into() }, Effect::ArmTrigger]
    );
    assert_eq!(item_ids(&state), vec!["a", "b", "c"]);
    assert_eq!(state.known_count(), 3);
    assert_eq!(state.cursor(), Some(PAGE_3));
    assert_eq!(state.phase(), Phase::Idle);

    let (state, _) = update(state, Msg::TriggerFired);
    let (state, effects) = page(state, PAGE_3, &["d"], None);
    assert_eq!(effects, vec![Effect::LookupIgnore { id: "d".into() }]);
    assert_eq!(item_ids(&state), vec!["a", "b", "c", "d"]);
    assert_eq!(state.phase(), Phase::Terminal(StopReason::NoMorePages));
    assert_eq!(state.cursor(), None);

    let labels: Vec<String> = state
        .view()
        .rows
        .iter()
        .filter_map(|row| match row {
            RowView::Divider { label } => Some(label.clone()),
            RowView::Item { .. } => None,
        })
        .collect();
    assert_eq!(labels, vec!["page 2", "page 3"]);
}

#[test]
fn triggers_while_in_flight_do_not_fetch_again() {
    init_logging();
    let state = loaded(&["a"], Some(PAGE_2));
    let (mut state, effects) = update(state, Msg::TriggerFired);
    let mut fetches = effects
        .iter()
        .filter(|effect| matches!(effect, Effect::FetchPage { .. }))
        .count();

    for _ in 0..10 {
        let (next, effects) = update(state, Msg::TriggerFired);
        fetches += effects
            .iter()
            .filter(|effect| matches!(effect, Effect::FetchPage { .. }))
            .count();
        state = next;
    }

    assert_eq!(fetches, 1);
    assert_eq!(state.phase(), Phase::FetchInFlight);
}

#[test]
fn terminal_state_never_fetches() {
    init_logging();
    let state = loaded(&["a"], None);
    assert_eq!(state.phase(), Phase::Terminal(StopReason::NoMorePages));

    let (state, effects) = update(state, Msg::TriggerFired);
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Terminal(StopReason::NoMorePages));
}

#[test]
fn merging_a_fully_known_page_changes_nothing_visible() {
    init_logging();
    let state = loaded(&["a", "b"], Some(PAGE_2));
    let rows_before = state.view().rows;

    let (state, _) = update(state, Msg::TriggerFired);
    let (state, effects) = page(state, PAGE_2, &["b", "a"], Some(PAGE_3));

    assert_eq!(state.view().rows, rows_before);
    assert_eq!(state.known_count(), 2);
    assert_eq!(effects, vec![Effect::ArmTrigger]);
    assert_eq!(state.cursor(), Some(PAGE_3));
}

#[test]
fn first_seen_title_wins() {
    init_logging();
    let state = loaded(&["a"], Some(PAGE_2));
    let (state, _) = update(state, Msg::TriggerFired);
    let renamed = Item {
        id: "a".into(),
        url: "/other-url-a/".into(),
        title: "Renamed".into(),
    };
    let (state, _) = update(
        state,
        Msg::PageLoaded {
            url: PAGE_2.to_string(),
            items: vec![renamed, item("b")],
            next_page: None,
        },
    );

    let first = state.item("a").unwrap();
    assert_eq!(first.title, "Thread a");
    assert_eq!(item_ids(&state), vec!["a", "b"]);
}

#[test]
fn unparsable_page_number_uses_error_divider() {
    init_logging();
    let next = "https://forums.example.com/hot-deals-f9/?page=2";
    let state = loaded(&["a"], Some(next));
    let (state, _) = update(state, Msg::TriggerFired);
    let (state, _) = page(state, next, &["b"], None);

    assert_eq!(
        state.view().rows[1],
        RowView::Divider {
            label: "page err".into()
        }
    );
}

#[test]
fn non_ascii_listing_url_still_gets_a_page_divider() {
    init_logging();
    let next = "https://forums.example.com/café2/";
    let state = loaded(&["a"], Some(next));
    let (state, _) = update(state, Msg::TriggerFired);
    let (state, _) = page(state, next, &["b"], None);

    assert_eq!(
        state.view().rows[1],
        RowView::Divider {
            label: "page 2".into()
        }
    );
    assert_eq!(item_ids(&state), vec!["a", "b"]);
}

#[test]
fn failed_fetch_keeps_cursor_and_retries_same_page() {
    init_logging();
    let state = loaded(&["a"], Some(PAGE_2));
    let (state, _) = update(state, Msg::TriggerFired);

    let (state, effects) = update(
        state,
        Msg::PageFailed {
            url: PAGE_2.to_string(),
        },
    );
    assert_eq!(effects, vec![Effect::ArmTrigger]);
    assert_eq!(state.phase(), Phase::Idle);
    assert_eq!(state.cursor(), Some(PAGE_2));
    assert_eq!(state.consecutive_failures(), 1);

    let (state, effects) = update(state, Msg::TriggerFired);
    assert_eq!(
        effects,
        vec![
            Effect::DisarmTrigger,
            Effect::FetchPage {
                url: PAGE_2.to_string()
            },
        ]
    );

    let (state, _) = page(state, PAGE_2, &["b"], Some(PAGE_3));
    assert_eq!(state.consecutive_failures(), 0);
}

#[test]
fn empty_page_is_a_parse_failure() {
    init_logging();
    let state = loaded(&["a"], Some(PAGE_2));
    let (state, _) = update(state, Msg::TriggerFired);
    let (state, effects) = page(state, PAGE_2, &[], Some(PAGE_3));

    assert_eq!(effects, vec![Effect::ArmTrigger]);
    assert_eq!(state.cursor(), Some(PAGE_2));
    assert_eq!(item_ids(&state), vec!["a"]);
}

#[test]
fn retries_are_bounded() {
    init_logging();
    let policy = RetryPolicy {
        max_consecutive_failures: Some(2),
    };
    let (state, _) = update(
        FeedState::with_retry_policy(policy),
        Msg::InitialPageLoaded {
            url: PAGE_1.to_string(),
            items: vec![item("a")],
            next_page: Some(PAGE_2.to_string()),
        },
    );

    let (state, _) = update(state, Msg::TriggerFired);
    let (state, effects) = update(state, Msg::PageFailed { url: PAGE_2.into() });
    assert_eq!(effects, vec![Effect::ArmTrigger]);

    let (state, _) = update(state, Msg::TriggerFired);
    let (state, effects) = update(state, Msg::PageFailed { url: PAGE_2.into() });
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Terminal(StopReason::RetriesExhausted));

    let (_, effects) = update(state, Msg::TriggerFired);
    assert!(effects.is_empty());
}

#[test]
fn unbounded_policy_keeps_retrying() {
    init_logging();
    let policy = RetryPolicy {
        max_consecutive_failures: None,
    };
    let (mut state, _) = update(
        FeedState::with_retry_policy(policy),
        Msg::InitialPageLoaded {
            url: PAGE_1.to_string(),
            items: vec![item("a")],
            next_page: Some(PAGE_2.to_string()),
        },
    );
    for _ in 0..50 {
        let (next, _) = update(state, Msg::TriggerFired);
        let (next, effects) = update(next, Msg::PageFailed { url: PAGE_2.into() });
        assert_eq!(effects, vec![Effect::ArmTrigger]);
        state = next;
    }
    assert_eq!(state.phase(), Phase::Idle);
}

#[test]
fn stale_completions_are_dropped() {
    init_logging();
    let state = loaded(&["a"], Some(PAGE_2));

    // Not in flight yet.
    let (next, effects) = page(state.clone(), PAGE_2, &["b"], None);
    assert_eq!(next, state);
    assert!(effects.is_empty());

    // In flight, but for a different page.
    let (state, _) = update(state, Msg::TriggerFired);
    let (next, effects) = page(state.clone(), PAGE_3, &["c"], None);
    assert_eq!(next, state);
    assert!(effects.is_empty());

    let (next, effects) = update(state.clone(), Msg::PageFailed { url: PAGE_3.into() });
    assert_eq!(next, state);
    assert!(effects.is_empty());
}

#[test]
fn identities_stay_unique_across_many_merges() {
    init_logging();
    let mut state = loaded(&["1", "2", "3"], Some("https://forums.example.com/f/2/"));
    for page_no in 2..8 {
        let url = format!("https://forums.example.com/f/{page_no}/");
        let next = format!("https://forums.example.com/f/{}/", page_no + 1);
        let ids: Vec<String> = (page_no..page_no + 4).map(|n| n.to_string()).collect();
        let (next_state, _) = update(state, Msg::TriggerFired);
        let (next_state, _) = update(
            next_state,
            Msg::PageLoaded {
                url,
                items: ids.iter().map(|id| item(id)).collect(),
                next_page: Some(next),
            },
        );
        state = next_state;
    }

    let mut ids = item_ids(&state);
    let total = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), total);
    assert_eq!(state.known_count(), total);
    assert_eq!(state.view().item_count, total);
}
