//! Event types for the TUI event loop.

use crossterm::event::KeyEvent;
use dealboard_core::{
    IntentTicket, LoadTicket, Opportunity, Outcome, Page, PipelinePayload, ReloadTicket, Stats,
};

#[derive(Debug, Clone)]
pub enum TuiEvent {
    Input(KeyEvent),
    Tick,
    Resize { width: u16, height: u16 },
    Backend(BackendEvent),
}

/// Results of remote calls, delivered back to the loop task.
#[derive(Debug, Clone)]
pub enum BackendEvent {
    Pipeline {
        ticket: LoadTicket,
        result: Result<PipelinePayload, String>,
    },
    Stats {
        ticket: ReloadTicket,
        result: Result<Stats, String>,
    },
    Intent {
        ticket: IntentTicket,
        outcome: Outcome,
    },
    List {
        seq: u64,
        result: Result<Page<Opportunity>, String>,
    },
}
