use crate::{ItemId, Phase, Visibility};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedViewModel {
    pub phase: Phase,
    pub next_page: Option<String>,
    pub rows: Vec<RowView>,
    pub item_count: usize,
    pub hidden_count: usize,
    pub dirty: bool,
}

impl FeedViewModel {
    /// Rows a renderer should draw: dividers plus items that are not hidden.
    pub fn displayed_rows(&self) -> impl Iterator<Item = &RowView> {
        self.rows.iter().filter(|row| {
            !matches!(
                row,
                RowView::Item {
                    visibility: Visibility::Hidden,
                    ..
                }
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowView {
    Divider {
        label: String,
    },
    Item {
        id: ItemId,
        url: String,
        title: String,
        visibility: Visibility,
    },
}
