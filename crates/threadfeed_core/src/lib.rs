//! Threadfeed core: pure pagination/ignore state machine and view-model helpers.
mod effect;
mod identity;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use identity::{item_id_from_url, page_number_from_url};
pub use msg::Msg;
pub use state::{FeedState, Item, ItemId, PageMarker, Phase, RetryPolicy, StopReason, Visibility};
pub use update::update;
pub use view_model::{FeedViewModel, RowView};
