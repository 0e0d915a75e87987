//! Filter bar widget: search text plus active filter chips.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

#[derive(Debug, Clone)]
pub struct FilterOption {
    pub label: String,
    pub active: bool,
}

impl FilterOption {
    pub fn new(label: impl Into<String>, active: bool) -> Self {
        Self {
            label: label.into(),
            active,
        }
    }
}

pub struct FilterBar<'a> {
    pub title: &'a str,
    pub search: &'a str,
    /// Show a cursor after the search text.
    pub editing: bool,
    pub filters: &'a [FilterOption],
    pub active_style: Style,
    pub inactive_style: Style,
}

impl<'a> FilterBar<'a> {
    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let search = if self.editing {
            format!("/{}_", self.search)
        } else if self.search.is_empty() {
            "/ to search".to_string()
        } else {
            format!("/{}", self.search)
        };
        let search_style = if self.editing {
            self.active_style.add_modifier(Modifier::BOLD)
        } else {
            self.inactive_style
        };

        let mut spans = vec![Span::styled(search, search_style), Span::raw("  ")];
        spans.extend(self.filters.iter().map(|filter| {
            let style = if filter.active {
                self.active_style
            } else {
                self.inactive_style
            };
            Span::styled(format!(" {} ", filter.label), style)
        }));

        let paragraph = Paragraph::new(Line::from(spans))
            .block(Block::default().title(self.title).borders(Borders::ALL));
        f.render_widget(paragraph, area);
    }
}
