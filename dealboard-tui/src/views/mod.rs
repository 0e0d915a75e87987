//! View rendering dispatch.

pub mod board;
pub mod list;

use crate::keys::InputMode;
use crate::nav::View;
use crate::notifications::NotificationLevel;
use crate::state::App;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render_view(f: &mut Frame<'_>, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.size());

    render_header(f, app, layout[0]);

    match app.active_view {
        View::Board => board::render(f, app, layout[1]),
        View::List => list::render(f, app, layout[1]),
    }

    render_footer(f, app, layout[2]);
}

fn render_header(f: &mut Frame<'_>, app: &App, area: Rect) {
    let tabs: Vec<Span> = View::all()
        .iter()
        .flat_map(|view| {
            let style = if *view == app.active_view {
                Style::default().fg(app.theme.primary).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(app.theme.text_dim)
            };
            [Span::styled(format!(" {} ", view.title()), style), Span::raw("|")]
        })
        .collect();

    let mut spans = vec![Span::styled(
        "DEALBOARD ",
        Style::default().fg(app.theme.secondary).add_modifier(Modifier::BOLD),
    )];
    spans.extend(tabs);
    if app.session.is_loading() || app.list_view.loading {
        spans.push(Span::styled(" loading...", Style::default().fg(app.theme.warning)));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(header, area);
}

fn footer_help(app: &App) -> &'static str {
    match (app.input_mode, app.active_view) {
        (InputMode::MoveTarget, _) => "Move to: 1 New  2 Contacted  3 Proposal  4 Negotiation  5 Won  6 Lost  • Esc cancel",
        (InputMode::ConfirmDelete, _) => "Delete selected opportunity? y confirm • any other key cancels",
        (InputMode::Search, _) => "Type to search • Enter apply • Esc cancel",
        (InputMode::Normal, View::Board) => {
            "h/l column • j/k card • </> move • m move to • d delete • / search • f order • r reload • Tab list • q quit"
        }
        (InputMode::Normal, View::List) => {
            "j/k row • [/] page • s direction • o sort field • t stage • / search • r reload • Tab board • q quit"
        }
    }
}

fn render_footer(f: &mut Frame<'_>, app: &App, area: Rect) {
    let prompt_mode = app.input_mode != InputMode::Normal;
    let (text, style) = match app.notifications.last() {
        Some(note) if !prompt_mode => {
            let color = match note.level {
                NotificationLevel::Info => app.theme.info,
                NotificationLevel::Warning => app.theme.warning,
                NotificationLevel::Error => app.theme.error,
                NotificationLevel::Success => app.theme.success,
            };
            let hint = if note.action.is_some() { "  [r] retry" } else { "" };
            (
                format!("{}: {}{}", note.level.label(), note.message, hint),
                Style::default().fg(color),
            )
        }
        _ => (footer_help(app).to_string(), Style::default().fg(app.theme.text_dim)),
    };
    let footer = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .style(style);
    f.render_widget(footer, area);
}
