use crate::{Item, ItemId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The listing the user opened has been parsed.
    InitialPageLoaded {
        url: String,
        items: Vec<Item>,
        next_page: Option<String>,
    },
    /// The trigger source asked for more items.
    TriggerFired,
    /// A page requested via `Effect::FetchPage` was fetched and parsed.
    PageLoaded {
        url: String,
        items: Vec<Item>,
        next_page: Option<String>,
    },
    /// A page requested via `Effect::FetchPage` could not be fetched or parsed.
    PageFailed { url: String },
    /// User clicked "ignore" on a row.
    IgnoreRequested(ItemId),
    /// User clicked "Ignore All".
    IgnoreAllRequested,
    /// The store answered an `Effect::LookupIgnore`. Store failures arrive as
    /// `ignored: false`.
    IgnoreLookupCompleted { id: ItemId, ignored: bool },
    /// User clicked "Show Hidden".
    ShowHiddenRequested,
    /// User asked to stop ignoring an item.
    UnignoreRequested(ItemId),
}
