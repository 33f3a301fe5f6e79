use feed_logging::{feed_debug, feed_warn};
use threadfeed_core::{Effect, Item, Msg};
use threadfeed_engine::{EngineEvent, EngineHandle, IgnoreData, ListingItem};

/// Executes core effects that need IO and turns engine completions back into
/// core messages. Trigger effects are handled by the session.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    /// Start the IO for `effect`. Returns `true` when an `EngineEvent` will
    /// follow.
    pub fn enqueue(&self, effect: Effect) -> bool {
        match effect {
            Effect::FetchPage { url } => {
                feed_debug!("FetchPage url={}", url);
                self.engine.load_page(url);
                true
            }
            Effect::LookupIgnore { id } => {
                self.engine.lookup_ignore(id);
                true
            }
            Effect::PersistIgnore { id, url, title } => {
                feed_debug!("PersistIgnore id={} url={}", id, url);
                self.engine.persist_ignore(id, IgnoreData { url, title });
                true
            }
            Effect::ForgetIgnore { id } => {
                self.engine.forget_ignore(id);
                true
            }
            Effect::ArmTrigger | Effect::DisarmTrigger => false,
        }
    }
}

/// Map an engine completion to the message the core expects, if any.
pub fn translate(event: EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::PageLoaded { url, result } => Some(match result {
            Ok(page) => Msg::PageLoaded {
                url,
                items: to_items(page.items),
                next_page: page.next_page,
            },
            Err(_) => Msg::PageFailed { url },
        }),
        EngineEvent::IgnoreLookup { id, result } => {
            let ignored = match result {
                Ok(entry) => entry.is_some(),
                Err(err) => {
                    feed_warn!("ignore lookup for {} failed, showing it: {}", id, err);
                    false
                }
            };
            Some(Msg::IgnoreLookupCompleted { id, ignored })
        }
        EngineEvent::IgnorePersisted { id, result } => {
            if let Err(err) = result {
                feed_warn!(
                    "could not persist ignore for {}; it will show again after reload: {}",
                    id,
                    err
                );
            }
            None
        }
        EngineEvent::IgnoreForgotten { id, result } => {
            if let Err(err) = result {
                feed_warn!("could not forget ignore for {}: {}", id, err);
            }
            None
        }
    }
}

pub fn to_items(links: Vec<ListingItem>) -> Vec<Item> {
    links
        .into_iter()
        .filter_map(|link| {
            let item = Item::from_link(link.url.as_str(), link.title);
            if item.is_none() {
                feed_warn!("skipping thread link without an id: {}", link.url);
            }
            item
        })
        .collect()
}
