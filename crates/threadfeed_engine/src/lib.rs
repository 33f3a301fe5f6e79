//! Threadfeed engine: page fetching, listing extraction, ignore store and
//! effect execution.
mod decode;
mod engine;
mod extract;
mod fetch;
mod persist;
mod store;
mod trigger;
mod types;

pub use decode::{decode_html, DecodeError, DecodedHtml};
pub use engine::{parse_listing_page, EngineHandle};
pub use extract::{ForumListingExtractor, ItemExtractor, ListingSelectors, SelectorError};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use persist::{ensure_store_dir, AtomicFileWriter, PersistError};
pub use store::{IgnoreData, IgnoreRecord, IgnoreStore, StoreError, IGNORED_TOPICS, SCHEMA_VERSION};
pub use trigger::{Subscription, TriggerSource};
pub use types::{
    EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput, ListingItem, ListingPage,
    PageFailure,
};
