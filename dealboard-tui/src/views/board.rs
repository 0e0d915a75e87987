//! Pipeline board view: one column per stage.

use crate::keys::InputMode;
use crate::state::{projection_label, App};
use crate::theme::{priority_color, stage_color};
use crate::widgets::{opportunity_fields, DetailPanel, FilterBar, FilterOption, StatsBar, StatusIndicator};
use dealboard_core::{BoardStatus, ProjectedColumn, Stage};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

pub fn render(f: &mut Frame<'_>, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(9),
        ])
        .split(area);

    StatsBar {
        stats: app.session.stats(),
        pending: app.session.pending_count(),
        theme: &app.theme,
    }
    .render(f, chunks[0]);

    let order = [FilterOption::new(format!("order: {}", projection_label(app.board_view.order)), true)];
    FilterBar {
        title: "Filter",
        search: if app.input_mode == InputMode::Search {
            &app.search_input
        } else {
            &app.query.text
        },
        editing: app.input_mode == InputMode::Search,
        filters: &order,
        active_style: Style::default().fg(app.theme.primary),
        inactive_style: Style::default().fg(app.theme.text_dim),
    }
    .render(f, chunks[1]);

    match app.session.status() {
        BoardStatus::Loading => StatusIndicator {
            title: "Pipeline".to_string(),
            status: "Loading pipeline...".to_string(),
            style: Style::default().fg(app.theme.text_dim),
        }
        .render(f, chunks[2].union(chunks[3])),
        BoardStatus::Failed(message) => StatusIndicator {
            title: "Pipeline".to_string(),
            status: format!("Could not load the pipeline: {}\n\nPress r to retry.", message),
            style: Style::default().fg(app.theme.error),
        }
        .render(f, chunks[2].union(chunks[3])),
        BoardStatus::Ready => {
            render_columns(f, app, chunks[2]);
            render_detail(f, app, chunks[3]);
        }
    }
}

fn render_columns(f: &mut Frame<'_>, app: &App, area: Rect) {
    let columns = app.session.project(app.board_view.order);
    let areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, Stage::COUNT as u32); Stage::COUNT])
        .split(area);

    for (index, column) in columns.iter().enumerate() {
        let focused = index == app.board_view.column;
        render_column(f, app, column, focused, areas[index]);
    }
}

fn render_column(f: &mut Frame<'_>, app: &App, column: &ProjectedColumn<'_>, focused: bool, area: Rect) {
    let color = stage_color(column.stage, &app.theme);
    let items: Vec<ListItem> = column
        .cards
        .iter()
        .map(|card| {
            let pending = app.session.is_pending(card.id);
            let mut title_style = Style::default().fg(priority_color(card.priority, &app.theme));
            let mut meta_style = Style::default().fg(app.theme.text_dim);
            if pending {
                title_style = title_style.add_modifier(Modifier::DIM | Modifier::ITALIC);
                meta_style = meta_style.add_modifier(Modifier::DIM);
            }
            let customer = card.customer_display().unwrap_or("-");
            ListItem::new(vec![
                Line::from(Span::styled(card.title.clone(), title_style)),
                Line::from(Span::styled(
                    format!("{} • {}", customer, card.amount.grouped()),
                    meta_style,
                )),
            ])
        })
        .collect();

    let title = format!("{} ({}) {}", column.stage.label(), column.len(), column.total.grouped());
    let border = if focused { app.theme.border_focus } else { app.theme.border };
    let list = List::new(items)
        .block(
            Block::default()
                .title(Span::styled(title, Style::default().fg(color)))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border)),
        )
        .highlight_style(
            Style::default()
                .bg(app.theme.bg_highlight)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if focused && !column.is_empty() {
        state.select(Some(app.board_view.card.min(column.len() - 1)));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn render_detail(f: &mut Frame<'_>, app: &App, area: Rect) {
    let mut fields = Vec::new();
    if let Some((id, _)) = app.selected_card() {
        if let Some(card) = app.session.store().get(id) {
            fields = opportunity_fields(card);
            if app.session.is_pending(id) {
                fields.push(("Sync", "waiting for the server".to_string()));
            }
        }
    }

    DetailPanel {
        title: "Details",
        fields,
        style: Style::default().fg(app.theme.secondary),
    }
    .render(f, area);
}
