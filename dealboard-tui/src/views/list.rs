//! Flat sales list view with paging and sorting.

use crate::keys::InputMode;
use crate::state::App;
use crate::theme::{priority_color, stage_color};
use crate::widgets::{opportunity_fields, DetailPanel, FilterBar, FilterOption, StatusIndicator};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let stage_label = app
        .list_view
        .stage
        .map(|stage| stage.label().to_string())
        .unwrap_or_else(|| "all stages".to_string());
    let filters = [
        FilterOption::new(format!("stage: {}", stage_label), app.list_view.stage.is_some()),
        FilterOption::new(format!("sort: {}", app.list_view.ordering), true),
        FilterOption::new(
            format!(
                "page {}/{} ({} total)",
                app.list_view.request.page + 1,
                app.list_view.page_count(),
                app.list_view.page.count
            ),
            false,
        ),
    ];
    FilterBar {
        title: "Filter",
        search: if app.input_mode == InputMode::Search {
            &app.search_input
        } else {
            &app.query.text
        },
        editing: app.input_mode == InputMode::Search,
        filters: &filters,
        active_style: Style::default().fg(app.theme.primary),
        inactive_style: Style::default().fg(app.theme.text_dim),
    }
    .render(f, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[1]);

    if let Some(message) = &app.list_view.error {
        StatusIndicator {
            title: "Sales".to_string(),
            status: format!("Could not load sales: {}\n\nPress r to retry.", message),
            style: Style::default().fg(app.theme.error),
        }
        .render(f, body[0]);
    } else {
        render_table(f, app, body[0]);
    }

    let fields = app
        .list_view
        .selected_record()
        .map(opportunity_fields)
        .unwrap_or_default();
    DetailPanel {
        title: "Details",
        fields,
        style: Style::default().fg(app.theme.secondary),
    }
    .render(f, body[1]);
}

fn render_table(f: &mut Frame<'_>, app: &App, area: Rect) {
    let header = Row::new(["Title", "Customer", "Stage", "Amount", "Priority"])
        .style(Style::default().fg(app.theme.primary).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = app
        .list_view
        .page
        .results
        .iter()
        .map(|record| {
            Row::new(vec![
                Cell::from(record.title.clone()),
                Cell::from(record.customer_display().unwrap_or("-").to_string()),
                Cell::from(record.stage.label()).style(Style::default().fg(stage_color(record.stage, &app.theme))),
                Cell::from(record.amount.grouped()),
                Cell::from(record.priority.label())
                    .style(Style::default().fg(priority_color(record.priority, &app.theme))),
            ])
        })
        .collect();

    let widths = [
        Constraint::Percentage(32),
        Constraint::Percentage(24),
        Constraint::Percentage(16),
        Constraint::Percentage(16),
        Constraint::Percentage(12),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().title("Sales").borders(Borders::ALL))
        .highlight_style(Style::default().bg(app.theme.bg_highlight).add_modifier(Modifier::BOLD));

    let mut state = TableState::default();
    if !app.list_view.page.results.is_empty() {
        state.select(Some(app.list_view.selected));
    }
    f.render_stateful_widget(table, area, &mut state);
}
