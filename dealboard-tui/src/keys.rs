//! Keybinding definitions for the TUI.
//!
//! Keys map to actions depending on the current input mode, so two-key
//! sequences (`m` + digit, `d` + `y`) are just a mode switch followed by a
//! mode-specific lookup.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use dealboard_core::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Normal,
    /// Waiting for a stage digit after `m`.
    MoveTarget,
    /// Waiting for `y` after `d`.
    ConfirmDelete,
    /// Editing the search text.
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    NextView,
    PrevView,
    ColumnLeft,
    ColumnRight,
    CardUp,
    CardDown,
    MovePrevStage,
    MoveNextStage,
    BeginMoveTo,
    MoveTo(Stage),
    BeginDelete,
    Confirm,
    Cancel,
    OpenSearch,
    SearchInput(char),
    SearchBackspace,
    SubmitSearch,
    CycleOrder,
    PrevPage,
    NextPage,
    FlipSort,
    CycleSortKey,
    CycleStageFilter,
    Refresh,
}

pub fn map_key(event: KeyEvent, mode: InputMode) -> Option<Action> {
    let KeyEvent { code, modifiers, .. } = event;

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Some(Action::Quit),
            KeyCode::Char('r') => Some(Action::Refresh),
            _ => None,
        };
    }

    match mode {
        InputMode::Normal => map_normal(code),
        InputMode::MoveTarget => match code {
            KeyCode::Char(c @ '1'..='6') => {
                let index = c as usize - '1' as usize;
                Stage::from_index(index).map(Action::MoveTo)
            }
            _ => Some(Action::Cancel),
        },
        InputMode::ConfirmDelete => match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(Action::Confirm),
            _ => Some(Action::Cancel),
        },
        InputMode::Search => match code {
            KeyCode::Enter => Some(Action::SubmitSearch),
            KeyCode::Esc => Some(Action::Cancel),
            KeyCode::Backspace => Some(Action::SearchBackspace),
            KeyCode::Char(c) => Some(Action::SearchInput(c)),
            _ => None,
        },
    }
}

fn map_normal(code: KeyCode) -> Option<Action> {
    match code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Esc => Some(Action::Cancel),
        KeyCode::Tab => Some(Action::NextView),
        KeyCode::BackTab => Some(Action::PrevView),
        KeyCode::Left | KeyCode::Char('h') => Some(Action::ColumnLeft),
        KeyCode::Right | KeyCode::Char('l') => Some(Action::ColumnRight),
        KeyCode::Up | KeyCode::Char('k') => Some(Action::CardUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::CardDown),
        KeyCode::Char('<') | KeyCode::Char('H') => Some(Action::MovePrevStage),
        KeyCode::Char('>') | KeyCode::Char('L') => Some(Action::MoveNextStage),
        KeyCode::Char('m') => Some(Action::BeginMoveTo),
        KeyCode::Char('d') => Some(Action::BeginDelete),
        KeyCode::Char('/') => Some(Action::OpenSearch),
        KeyCode::Char('f') => Some(Action::CycleOrder),
        KeyCode::Char('[') => Some(Action::PrevPage),
        KeyCode::Char(']') => Some(Action::NextPage),
        KeyCode::Char('s') => Some(Action::FlipSort),
        KeyCode::Char('o') => Some(Action::CycleSortKey),
        KeyCode::Char('t') => Some(Action::CycleStageFilter),
        KeyCode::Char('r') => Some(Action::Refresh),
        _ => None,
    }
}
