use std::fmt::Write as _;

use serde::Serialize;
use threadfeed_core::{FeedViewModel, Phase, RowView, StopReason, Visibility};

/// Plain-text listing of every displayed row followed by a summary line.
pub fn render_text(view: &FeedViewModel) -> String {
    let mut out = String::new();
    for row in view.displayed_rows() {
        push_row(&mut out, row);
    }
    out.push_str(&summary_line(view));
    out.push('\n');
    out
}

/// Incremental text output for follow mode. Rows are only ever appended to a
/// feed, so everything past the last printed index is new.
#[derive(Debug, Default)]
pub struct TextTail {
    printed: usize,
}

impl TextTail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_new(&mut self, view: &FeedViewModel) -> String {
        let mut out = String::new();
        for row in view.rows.iter().skip(self.printed) {
            if !is_hidden(row) {
                push_row(&mut out, row);
            }
        }
        self.printed = view.rows.len();
        out
    }
}

pub fn summary_line(view: &FeedViewModel) -> String {
    let next = match view.phase {
        Phase::Terminal(StopReason::NoMorePages) => "end of listing".to_string(),
        Phase::Terminal(StopReason::RetriesExhausted) => {
            format!("gave up on {}", view.next_page.as_deref().unwrap_or("?"))
        }
        Phase::Idle | Phase::FetchInFlight => match &view.next_page {
            Some(url) => format!("next {url}"),
            None => "no next page".to_string(),
        },
    };
    format!(
        "{} threads, {} hidden; {}",
        view.item_count, view.hidden_count, next
    )
}

fn push_row(out: &mut String, row: &RowView) {
    match row {
        RowView::Divider { label } => {
            let _ = writeln!(out, "-- {label} --");
        }
        RowView::Item {
            id,
            url,
            title,
            visibility,
        } => {
            let marker = if *visibility == Visibility::Revealed {
                " (ignored)"
            } else {
                ""
            };
            let _ = writeln!(out, "[{id}] {title}{marker}");
            let _ = writeln!(out, "    {url}");
        }
    }
}

fn is_hidden(row: &RowView) -> bool {
    matches!(
        row,
        RowView::Item {
            visibility: Visibility::Hidden,
            ..
        }
    )
}

#[derive(Debug, Serialize)]
struct JsonFeed<'a> {
    phase: &'static str,
    next_page: Option<&'a str>,
    item_count: usize,
    hidden_count: usize,
    rows: Vec<JsonRow<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum JsonRow<'a> {
    Divider {
        label: &'a str,
    },
    Item {
        id: &'a str,
        url: &'a str,
        title: &'a str,
        ignored: bool,
    },
}

/// JSON document with the displayed rows and pagination state.
pub fn render_json(view: &FeedViewModel) -> serde_json::Result<String> {
    let rows = view
        .displayed_rows()
        .map(|row| match row {
            RowView::Divider { label } => JsonRow::Divider { label },
            RowView::Item {
                id,
                url,
                title,
                visibility,
            } => JsonRow::Item {
                id,
                url,
                title,
                ignored: *visibility != Visibility::Visible,
            },
        })
        .collect();
    let feed = JsonFeed {
        phase: phase_name(view.phase),
        next_page: view.next_page.as_deref(),
        item_count: view.item_count,
        hidden_count: view.hidden_count,
        rows,
    };
    serde_json::to_string_pretty(&feed)
}

fn phase_name(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "idle",
        Phase::FetchInFlight => "fetching",
        Phase::Terminal(StopReason::NoMorePages) => "complete",
        Phase::Terminal(StopReason::RetriesExhausted) => "retries_exhausted",
    }
}
