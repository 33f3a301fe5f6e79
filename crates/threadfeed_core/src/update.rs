use crate::{Effect, FeedState, Item, ItemId, Msg, PageMarker, Phase, Visibility};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: FeedState, msg: Msg) -> (FeedState, Vec<Effect>) {
    let effects = match msg {
        Msg::InitialPageLoaded {
            url: _,
            items,
            next_page,
        } => {
            if state.has_started() {
                return (state, Vec::new());
            }
            state.mark_started();
            let merged = state.merge_items(items, None);
            let mut effects = lookup_effects(merged);
            if state.advance_cursor(next_page) {
                effects.push(Effect::ArmTrigger);
            }
            effects
        }
        Msg::TriggerFired => match (state.phase(), state.cursor()) {
            (Phase::Idle, Some(url)) if state.has_started() => {
                let url = url.to_string();
                state.begin_fetch();
                vec![Effect::DisarmTrigger, Effect::FetchPage { url }]
            }
            // In flight, terminal, or not loaded yet: nothing to do.
            _ => Vec::new(),
        },
        Msg::PageLoaded {
            url,
            items,
            next_page,
        } => {
            if !state.is_awaiting(&url) {
                return (state, Vec::new());
            }
            if items.is_empty() {
                // A page without any thread rows is treated as unparsable.
                failure_effects(&mut state)
            } else {
                let merged = state.merge_items(items, Some(PageMarker::from_url(&url)));
                let mut effects = lookup_effects(merged);
                if state.advance_cursor(next_page) {
                    effects.push(Effect::ArmTrigger);
                }
                effects
            }
        }
        Msg::PageFailed { url } => {
            if !state.is_awaiting(&url) {
                return (state, Vec::new());
            }
            failure_effects(&mut state)
        }
        Msg::IgnoreRequested(id) => ignore(&mut state, &id).into_iter().collect(),
        Msg::IgnoreAllRequested => {
            let ids: Vec<ItemId> = state.items().map(|item| item.id.clone()).collect();
            ids.iter()
                .filter_map(|id| ignore(&mut state, id))
                .collect()
        }
        Msg::IgnoreLookupCompleted { id, ignored } => {
            // Rows the user already revealed or ignored keep their state.
            if ignored && state.visibility(&id) == Some(Visibility::Visible) {
                state.hide(&id);
            }
            Vec::new()
        }
        Msg::ShowHiddenRequested => {
            state.reveal_hidden();
            Vec::new()
        }
        Msg::UnignoreRequested(id) => {
            state.unhide(&id);
            vec![Effect::ForgetIgnore { id }]
        }
    };

    (state, effects)
}

fn lookup_effects(merged: Vec<ItemId>) -> Vec<Effect> {
    merged
        .into_iter()
        .map(|id| Effect::LookupIgnore { id })
        .collect()
}

fn failure_effects(state: &mut FeedState) -> Vec<Effect> {
    if state.record_failure() {
        vec![Effect::ArmTrigger]
    } else {
        Vec::new()
    }
}

fn ignore(state: &mut FeedState, id: &str) -> Option<Effect> {
    let Item { id, url, title } = state.hide(id)?;
    Some(Effect::PersistIgnore { id, url, title })
}
