//! Detail panel widget for showing field/value pairs.

use dealboard_core::Opportunity;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub struct DetailPanel<'a> {
    pub title: &'a str,
    pub fields: Vec<(&'a str, String)>,
    pub style: Style,
}

impl<'a> DetailPanel<'a> {
    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let lines: Vec<Line> = if self.fields.is_empty() {
            vec![Line::from(Span::raw("Nothing selected"))]
        } else {
            self.fields
                .iter()
                .map(|(label, value)| {
                    Line::from(vec![
                        Span::styled(format!("{}: ", label), self.style),
                        Span::raw(value.clone()),
                    ])
                })
                .collect()
        };

        let widget = Paragraph::new(Text::from(lines))
            .block(Block::default().title(self.title).borders(Borders::ALL))
            .wrap(Wrap { trim: true });

        f.render_widget(widget, area);
    }
}

/// Display fields for one opportunity, shared by both views.
pub fn opportunity_fields(card: &Opportunity) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("ID", card.id.to_string()),
        ("Title", card.title.clone()),
        ("Stage", card.stage.label().to_string()),
        ("Amount", card.amount.grouped()),
        ("Priority", card.priority.label().to_string()),
    ];
    if let Some(customer) = card.customer_display() {
        fields.push(("Customer", customer.to_string()));
    }
    if let Some(email) = card
        .customer_details
        .as_ref()
        .and_then(|details| details.email.clone())
    {
        fields.push(("Email", email));
    }
    if let Some(date) = card.expected_close_date {
        fields.push(("Expected close", date.format("%Y-%m-%d").to_string()));
    }
    if let Some(description) = &card.description {
        fields.push(("Description", description.clone()));
    }
    if let Some(updated) = card.last_touched() {
        fields.push(("Updated", updated.format("%Y-%m-%d %H:%M").to_string()));
    }
    fields
}
