use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::types::{ListingItem, ListingPage};

/// CSS selectors describing a forum listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSelectors {
    /// One element per thread row.
    pub row: String,
    /// Title block inside a row.
    pub topic: String,
    /// Anchor inside the title block; its href and text become the item.
    pub title_link: String,
    /// Anchor pointing at the following page.
    pub next_page: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            row: "li.row.topic".to_string(),
            topic: "h3.topictitle".to_string(),
            title_link: "a.topic_title_link".to_string(),
            next_page: "a.pagination_next".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid selector {selector:?}: {message}")]
pub struct SelectorError {
    pub selector: String,
    pub message: String,
}

pub trait ItemExtractor: Send + Sync {
    /// Pull thread links and the next-page link out of a listing document.
    /// Relative hrefs are resolved against `page_url`.
    fn extract(&self, html: &str, page_url: &str) -> ListingPage;
}

#[derive(Debug)]
pub struct ForumListingExtractor {
    row: Selector,
    topic: Selector,
    title_link: Selector,
    next_page: Selector,
}

impl ForumListingExtractor {
    pub fn new(selectors: &ListingSelectors) -> Result<Self, SelectorError> {
        Ok(Self {
            row: parse_selector(&selectors.row)?,
            topic: parse_selector(&selectors.topic)?,
            title_link: parse_selector(&selectors.title_link)?,
            next_page: parse_selector(&selectors.next_page)?,
        })
    }

    fn item_from_row(&self, row: ElementRef<'_>, base: Option<&Url>) -> Option<ListingItem> {
        let link = row
            .select(&self.topic)
            .next()?
            .select(&self.title_link)
            .next()?;
        let href = link.value().attr("href")?;
        let title = link.text().collect::<String>().trim().to_string();
        Some(ListingItem {
            url: resolve(base, href),
            title,
        })
    }
}

impl ItemExtractor for ForumListingExtractor {
    fn extract(&self, html: &str, page_url: &str) -> ListingPage {
        let doc = Html::parse_document(html);
        let base = Url::parse(page_url).ok();

        let items = doc
            .select(&self.row)
            .filter_map(|row| self.item_from_row(row, base.as_ref()))
            .collect();

        let next_page = doc
            .select(&self.next_page)
            .next()
            .and_then(|link| link.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .map(|href| resolve(base.as_ref(), href));

        ListingPage { items, next_page }
    }
}

fn parse_selector(raw: &str) -> Result<Selector, SelectorError> {
    Selector::parse(raw).map_err(|err| SelectorError {
        selector: raw.to_string(),
        message: err.to_string(),
    })
}

fn resolve(base: Option<&Url>, href: &str) -> String {
    base.and_then(|base| base.join(href).ok())
        .map(String::from)
        .unwrap_or_else(|| href.to_string())
}
