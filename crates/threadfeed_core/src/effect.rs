use crate::ItemId;

/// Side effects requested by [`crate::update`]; executed by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Fetch and parse the listing page at `url`.
    FetchPage { url: String },
    /// Subscribe to the trigger source so the next signal loads a page.
    ArmTrigger,
    /// Dispose the trigger subscription.
    DisarmTrigger,
    /// Query the ignore store for `id`.
    LookupIgnore { id: ItemId },
    /// Upsert an ignore entry.
    PersistIgnore {
        id: ItemId,
        url: String,
        title: String,
    },
    /// Delete the ignore entry for `id`.
    ForgetIgnore { id: ItemId },
}
