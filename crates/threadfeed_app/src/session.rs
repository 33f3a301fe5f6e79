use std::mem;

use feed_logging::{feed_debug, feed_info};
use threadfeed_core::{update, Effect, FeedState, Msg, Phase, RetryPolicy};
use threadfeed_engine::{
    EngineEvent, EngineHandle, PageFailure, StoreError, Subscription, TriggerSource,
};
use tokio::sync::mpsc;

use crate::effects::{self, EffectRunner};

/// Owns the feed state for one opened listing and is the only place it is
/// mutated. Messages are applied one at a time; IO runs on the engine and
/// comes back through the event channel.
pub struct FeedSession {
    state: FeedState,
    runner: EffectRunner,
    events: mpsc::UnboundedReceiver<EngineEvent>,
    trigger: TriggerSource,
    subscription: Option<Subscription>,
    pending: usize,
}

impl FeedSession {
    pub fn new(
        engine: EngineHandle,
        events: mpsc::UnboundedReceiver<EngineEvent>,
        trigger: TriggerSource,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            state: FeedState::with_retry_policy(retry),
            runner: EffectRunner::new(engine),
            events,
            trigger,
            subscription: None,
            pending: 0,
        }
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut FeedState {
        &mut self.state
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state.phase(), Phase::Terminal(_))
    }

    /// Load the first page of a listing and apply stored ignore state to it.
    pub async fn open(&mut self, url: &str) -> Result<(), PageFailure> {
        let page = self.runner.engine().fetch_listing(url).await?;
        self.dispatch(Msg::InitialPageLoaded {
            url: url.to_string(),
            items: effects::to_items(page.items),
            next_page: page.next_page,
        });
        self.settle().await;
        Ok(())
    }

    /// Apply one message and start whatever it asks for.
    pub fn dispatch(&mut self, msg: Msg) {
        let state = mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;

        for effect in effects {
            match effect {
                Effect::ArmTrigger => {
                    self.subscription = Some(self.trigger.subscribe());
                }
                Effect::DisarmTrigger => {
                    if let Some(subscription) = self.subscription.take() {
                        subscription.dispose();
                    }
                }
                effect => {
                    if self.runner.enqueue(effect) {
                        self.pending += 1;
                    }
                }
            }
        }
    }

    /// Process queued trigger signals and engine completions until no work is
    /// outstanding.
    pub async fn settle(&mut self) {
        loop {
            if self
                .subscription
                .as_mut()
                .is_some_and(|subscription| subscription.try_next())
            {
                self.dispatch(Msg::TriggerFired);
                continue;
            }
            if self.pending == 0 {
                break;
            }
            let Some(event) = self.events.recv().await else {
                break;
            };
            self.pending -= 1;
            if let Some(msg) = effects::translate(event) {
                self.dispatch(msg);
            }
        }
        feed_debug!(
            "settled: phase={:?} items={} hidden={}",
            self.state.phase(),
            self.state.known_count(),
            self.state.hidden_ids().len()
        );
    }

    /// Stop ignoring `id`, in this session and in the store. Returns `false`
    /// when the store had no entry for it.
    pub async fn unignore(&mut self, id: &str) -> Result<bool, StoreError> {
        if self.runner.engine().store().get_by_key(id).await?.is_none() {
            return Ok(false);
        }
        self.dispatch(Msg::UnignoreRequested(id.to_string()));
        self.settle().await;
        Ok(true)
    }

    /// Signal the trigger source and wait for the resulting load. Returns
    /// `false` when no load could be started because nothing is subscribed.
    pub async fn load_more(&mut self) -> bool {
        if !self.trigger.signal() {
            feed_info!("no further pages to load ({:?})", self.state.phase());
            return false;
        }
        self.settle().await;
        true
    }
}
