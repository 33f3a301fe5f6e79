use std::sync::Arc;

use feed_logging::{feed_info, feed_warn};
use tokio::sync::mpsc;

use crate::decode::decode_html;
use crate::extract::ItemExtractor;
use crate::fetch::Fetcher;
use crate::store::{IgnoreData, IgnoreStore};
use crate::{EngineEvent, FetchOutput, ListingPage, PageFailure};

/// Runs IO for the feed on the current Tokio runtime and reports each
/// completion as an [`EngineEvent`]. Every command is independent: nothing is
/// shared between two page loads or two store operations.
#[derive(Clone)]
pub struct EngineHandle {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn ItemExtractor>,
    store: IgnoreStore,
    event_tx: mpsc::UnboundedSender<EngineEvent>,
}

impl EngineHandle {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn ItemExtractor>,
        store: IgnoreStore,
    ) -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let handle = Self {
            fetcher,
            extractor,
            store,
            event_tx,
        };
        (handle, event_rx)
    }

    pub fn store(&self) -> &IgnoreStore {
        &self.store
    }

    /// Fetch and parse a listing page, waiting for the result.
    pub async fn fetch_listing(&self, url: &str) -> Result<ListingPage, PageFailure> {
        let output = self.fetcher.fetch(url).await?;
        let page = parse_listing_page(&output, self.extractor.as_ref())?;
        feed_info!(
            "parsed {} threads from {} (next page: {})",
            page.items.len(),
            url,
            page.next_page.as_deref().unwrap_or("none")
        );
        Ok(page)
    }

    /// Start loading a page; reports `EngineEvent::PageLoaded`.
    pub fn load_page(&self, url: String) {
        let engine = self.clone();
        tokio::spawn(async move {
            let result = engine.fetch_listing(&url).await;
            if let Err(err) = &result {
                feed_warn!("loading {} failed: {}", url, err);
            }
            engine.emit(EngineEvent::PageLoaded { url, result });
        });
    }

    /// Start a primary-key lookup; reports `EngineEvent::IgnoreLookup`.
    pub fn lookup_ignore(&self, id: String) {
        let engine = self.clone();
        tokio::spawn(async move {
            let result = engine.store.get_by_key(&id).await;
            engine.emit(EngineEvent::IgnoreLookup { id, result });
        });
    }

    /// Start an upsert; reports `EngineEvent::IgnorePersisted`.
    pub fn persist_ignore(&self, id: String, data: IgnoreData) {
        let engine = self.clone();
        tokio::spawn(async move {
            let result = engine.store.insert(&id, data).await;
            engine.emit(EngineEvent::IgnorePersisted { id, result });
        });
    }

    /// Start a delete; reports `EngineEvent::IgnoreForgotten`.
    pub fn forget_ignore(&self, id: String) {
        let engine = self.clone();
        tokio::spawn(async move {
            let result = engine.store.delete(&id).await.map(|_| ());
            engine.emit(EngineEvent::IgnoreForgotten { id, result });
        });
    }

    fn emit(&self, event: EngineEvent) {
        // The receiver is gone once the session shut down; nothing to report to.
        let _ = self.event_tx.send(event);
    }
}

/// Decode a fetched body and extract its listing. A page without any thread
/// rows is a parse failure.
pub fn parse_listing_page(
    output: &FetchOutput,
    extractor: &dyn ItemExtractor,
) -> Result<ListingPage, PageFailure> {
    let decoded = decode_html(&output.bytes, output.metadata.content_type.as_deref())
        .map_err(|err| PageFailure::Parse(err.to_string()))?;
    let page = extractor.extract(&decoded.html, &output.metadata.final_url);
    if page.items.is_empty() {
        return Err(PageFailure::Parse(format!(
            "no thread rows in {}",
            output.metadata.final_url
        )));
    }
    Ok(page)
}
