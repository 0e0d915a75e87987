//! Stats bar: total count, pipeline value and per-stage counts.

use crate::theme::{stage_color, SynthBruteTheme};
use dealboard_core::{Stage, Stats};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub struct StatsBar<'a> {
    pub stats: Option<&'a Stats>,
    pub pending: usize,
    pub theme: &'a SynthBruteTheme,
}

impl<'a> StatsBar<'a> {
    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let line = match self.stats {
            None => Line::from(Span::styled(
                "Stats loading...",
                Style::default().fg(self.theme.text_dim),
            )),
            Some(stats) => {
                let mut spans = vec![
                    Span::styled(
                        format!("{} deals", stats.total_count),
                        Style::default().fg(self.theme.text).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                    Span::styled(
                        format!("pipeline {}", stats.total_value.grouped()),
                        Style::default().fg(self.theme.primary),
                    ),
                    Span::raw("  |"),
                ];
                for stage in Stage::ALL {
                    spans.push(Span::styled(
                        format!(" {} {}", stage.label(), stats.count(stage)),
                        Style::default().fg(stage_color(stage, self.theme)),
                    ));
                }
                if self.pending > 0 {
                    spans.push(Span::styled(
                        format!("  | {} syncing", self.pending),
                        Style::default().fg(self.theme.warning),
                    ));
                }
                Line::from(spans)
            }
        };
        let paragraph = Paragraph::new(line).block(Block::default().title("Stats").borders(Borders::ALL));
        f.render_widget(paragraph, area);
    }
}
