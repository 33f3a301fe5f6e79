use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::identity::{item_id_from_url, page_number_from_url};
use crate::view_model::{FeedViewModel, RowView};

pub type ItemId = String;

/// One thread in the listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub url: String,
    pub title: String,
}

impl Item {
    /// Build an item from an extracted link, deriving its identity from `url`.
    /// Returns `None` when no identity can be derived.
    pub fn from_link(url: impl Into<String>, title: impl Into<String>) -> Option<Self> {
        let url = url.into();
        let id = item_id_from_url(&url)?;
        Some(Self {
            id,
            url,
            title: title.into(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    FetchInFlight,
    Terminal(StopReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The last fetched page had no next-page link.
    NoMorePages,
    /// The same page failed too many times in a row.
    RetriesExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
    /// Hidden earlier, shown again by "Show Hidden".
    Revealed,
}

/// Label for the divider placed in front of a merged page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMarker {
    Number(u32),
    Unparsed,
}

impl PageMarker {
    pub fn from_url(url: &str) -> Self {
        page_number_from_url(url).map_or(PageMarker::Unparsed, PageMarker::Number)
    }
}

impl fmt::Display for PageMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageMarker::Number(n) => write!(f, "page {n}"),
            PageMarker::Unparsed => write!(f, "page err"),
        }
    }
}

/// Bound on consecutive failures of the same page before pagination gives up.
/// `None` retries forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_consecutive_failures: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_consecutive_failures: Some(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Row {
    Divider(PageMarker),
    Item { item: Item, visibility: Visibility },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedState {
    phase: Phase,
    cursor: Option<String>,
    started: bool,
    known: HashSet<ItemId>,
    rows: Vec<Row>,
    row_index: HashMap<ItemId, usize>,
    hidden: Vec<ItemId>,
    consecutive_failures: u32,
    retry: RetryPolicy,
    dirty: bool,
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retry_policy(retry: RetryPolicy) -> Self {
        Self {
            retry,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// URL of the next page to load; `None` once pagination is exhausted.
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn is_known(&self, id: &str) -> bool {
        self.known.contains(id)
    }

    pub fn known_count(&self) -> usize {
        self.known.len()
    }

    pub fn hidden_ids(&self) -> &[ItemId] {
        &self.hidden
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn visibility(&self, id: &str) -> Option<Visibility> {
        match self.row_index.get(id).and_then(|idx| self.rows.get(*idx)) {
            Some(Row::Item { visibility, .. }) => Some(*visibility),
            _ => None,
        }
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        match self.row_index.get(id).and_then(|idx| self.rows.get(*idx)) {
            Some(Row::Item { item, .. }) => Some(item),
            _ => None,
        }
    }

    /// Items in rendered order, regardless of visibility.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.rows.iter().filter_map(|row| match row {
            Row::Item { item, .. } => Some(item),
            Row::Divider(_) => None,
        })
    }

    pub fn view(&self) -> FeedViewModel {
        let rows = self
            .rows
            .iter()
            .map(|row| match row {
                Row::Divider(marker) => RowView::Divider {
                    label: marker.to_string(),
                },
                Row::Item { item, visibility } => RowView::Item {
                    id: item.id.clone(),
                    url: item.url.clone(),
                    title: item.title.clone(),
                    visibility: *visibility,
                },
            })
            .collect();
        FeedViewModel {
            phase: self.phase,
            next_page: self.cursor.clone(),
            rows,
            item_count: self.known.len(),
            hidden_count: self.hidden.len(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, clearing the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_started(&mut self) {
        self.started = true;
        self.dirty = true;
    }

    /// True when a completion for `url` is the one the state is waiting for.
    pub(crate) fn is_awaiting(&self, url: &str) -> bool {
        self.phase == Phase::FetchInFlight && self.cursor.as_deref() == Some(url)
    }

    pub(crate) fn begin_fetch(&mut self) {
        self.phase = Phase::FetchInFlight;
        self.dirty = true;
    }

    /// Append every item not seen before, in order, behind an optional
    /// divider. The divider is only written when at least one item is new.
    /// Returns the identities that were appended.
    pub(crate) fn merge_items(
        &mut self,
        items: Vec<Item>,
        divider: Option<PageMarker>,
    ) -> Vec<ItemId> {
        let mut merged = Vec::new();
        for item in items {
            if !self.known.insert(item.id.clone()) {
                continue;
            }
            if merged.is_empty() {
                if let Some(marker) = divider {
                    self.rows.push(Row::Divider(marker));
                }
            }
            merged.push(item.id.clone());
            self.row_index.insert(item.id.clone(), self.rows.len());
            self.rows.push(Row::Item {
                item,
                visibility: Visibility::Visible,
            });
        }
        if !merged.is_empty() {
            self.dirty = true;
        }
        merged
    }

    /// Move the cursor to the page's next link. Returns `true` when more pages
    /// remain and the state is back to `Idle`.
    pub(crate) fn advance_cursor(&mut self, next_page: Option<String>) -> bool {
        self.consecutive_failures = 0;
        self.cursor = next_page;
        self.dirty = true;
        if self.cursor.is_some() {
            self.phase = Phase::Idle;
            true
        } else {
            self.phase = Phase::Terminal(StopReason::NoMorePages);
            false
        }
    }

    /// Record a failed fetch of the cursor page. Returns `true` when the page
    /// may be retried on the next trigger.
    pub(crate) fn record_failure(&mut self) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.dirty = true;
        let exhausted = self
            .retry
            .max_consecutive_failures
            .is_some_and(|max| self.consecutive_failures >= max);
        if exhausted {
            self.phase = Phase::Terminal(StopReason::RetriesExhausted);
            false
        } else {
            self.phase = Phase::Idle;
            true
        }
    }

    /// Hide a row and remember it in the hidden registry. Returns the hidden
    /// item, or `None` when the id is not rendered.
    pub(crate) fn hide(&mut self, id: &str) -> Option<Item> {
        let idx = *self.row_index.get(id)?;
        let Some(Row::Item { item, visibility }) = self.rows.get_mut(idx) else {
            return None;
        };
        if *visibility != Visibility::Hidden {
            *visibility = Visibility::Hidden;
            self.dirty = true;
        }
        let item = item.clone();
        if !self.hidden.iter().any(|hidden| hidden == id) {
            self.hidden.push(item.id.clone());
        }
        Some(item)
    }

    pub(crate) fn reveal_hidden(&mut self) {
        for id in &self.hidden {
            let Some(idx) = self.row_index.get(id) else {
                continue;
            };
            if let Some(Row::Item { visibility, .. }) = self.rows.get_mut(*idx) {
                if *visibility == Visibility::Hidden {
                    *visibility = Visibility::Revealed;
                    self.dirty = true;
                }
            }
        }
    }

    /// Drop an item from the hidden registry and show it normally.
    pub(crate) fn unhide(&mut self, id: &str) {
        let before = self.hidden.len();
        self.hidden.retain(|hidden| hidden != id);
        if self.hidden.len() != before {
            self.dirty = true;
        }
        let Some(idx) = self.row_index.get(id) else {
            return;
        };
        if let Some(Row::Item { visibility, .. }) = self.rows.get_mut(*idx) {
            if *visibility != Visibility::Visible {
                *visibility = Visibility::Visible;
                self.dirty = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> Item {
        Item {
            id: id.to_string(),
            url: format!("/thread-{id}/"),
            title: format!("Thread {id}"),
        }
    }

    #[test]
    fn divider_only_written_when_something_is_new() {
        let mut state = FeedState::new();
        state.merge_items(vec![item("a")], None);

        let merged = state.merge_items(vec![item("a")], Some(PageMarker::Number(2)));
        assert!(merged.is_empty());
        assert_eq!(state.rows.len(), 1);

        let merged = state.merge_items(vec![item("a"), item("b")], Some(PageMarker::Number(3)));
        assert_eq!(merged, vec!["b".to_string()]);
        assert_eq!(state.rows[1], Row::Divider(PageMarker::Number(3)));
        assert_eq!(state.row_index.get("b"), Some(&2));
    }

    #[test]
    fn hidden_registry_has_no_duplicates() {
        let mut state = FeedState::new();
        state.merge_items(vec![item("a")], None);
        assert!(state.hide("a").is_some());
        assert!(state.hide("a").is_some());
        assert_eq!(state.hidden_ids(), ["a".to_string()]);
        assert!(state.hide("missing").is_none());
    }

    #[test]
    fn marker_labels() {
        assert_eq!(PageMarker::from_url("/f/7/").to_string(), "page 7");
        assert_eq!(PageMarker::from_url("/f/").to_string(), "page err");
    }
}
