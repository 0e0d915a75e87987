//! Application state and view state definitions.

use crate::config::TuiConfig;
use crate::driver::BoardDriver;
use crate::events::{BackendEvent, TuiEvent};
use crate::keys::{Action, InputMode};
use crate::nav::View;
use crate::notifications::{Notification, NotificationLevel};
use crate::persistence::PersistedState;
use crate::theme::SynthBruteTheme;
use crate::traits::SalesBackend;
use dealboard_core::{
    BoardSession, BoardStatus, Opportunity, OpportunityId, Ordering, Page, PageRequest,
    ProjectionOrder, SearchQuery, SortDirection, SortKey, Stage,
};
use std::sync::Arc;
use tokio::sync::mpsc;

const MAX_NOTIFICATIONS: usize = 50;
const NOTIFICATION_TTL_SECS: i64 = 6;

pub struct App {
    pub config: TuiConfig,
    pub theme: SynthBruteTheme,
    pub driver: BoardDriver,
    pub session: BoardSession,
    pub active_view: View,

    pub board_view: BoardViewState,
    pub list_view: ListViewState,

    /// Search text shared by both views.
    pub query: SearchQuery,
    pub input_mode: InputMode,
    pub search_input: String,
    pub delete_target: Option<(OpportunityId, Stage)>,

    pub notifications: Vec<Notification>,
}

impl App {
    pub fn new(config: TuiConfig, backend: Arc<dyn SalesBackend>, events: mpsc::Sender<TuiEvent>) -> Self {
        let driver = BoardDriver::new(backend, config.page_size, events);
        let list_view = ListViewState::new(config.page_size);
        Self {
            config,
            theme: SynthBruteTheme::synthbrute(),
            driver,
            session: BoardSession::new(),
            active_view: View::Board,
            board_view: BoardViewState::default(),
            list_view,
            query: SearchQuery::default(),
            input_mode: InputMode::Normal,
            search_input: String::new(),
            delete_target: None,
            notifications: Vec::new(),
        }
    }

    pub fn restore(&mut self, state: PersistedState) {
        self.active_view = state.active_view;
        self.query.text = state.filter_text;
        self.list_view.ordering = state.list_ordering;
        self.list_view.stage = state.list_stage;
    }

    pub fn persisted(&self) -> PersistedState {
        PersistedState {
            active_view: self.active_view,
            filter_text: self.query.text.clone(),
            list_ordering: self.list_view.ordering,
            list_stage: self.list_view.stage,
        }
    }

    /// Initial fetches. The board always loads since it owns the stats.
    pub fn start(&mut self) {
        self.refresh_board();
        if self.active_view == View::List {
            self.refresh_list();
        }
    }

    /// Tear the board down; late results become no-ops.
    pub fn shutdown(&mut self) {
        self.session.close();
    }

    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        self.push_notification(Notification::new(level, message));
    }

    pub fn push_notification(&mut self, notification: Notification) {
        self.notifications.push(notification);
        if self.notifications.len() > MAX_NOTIFICATIONS {
            let excess = self.notifications.len() - MAX_NOTIFICATIONS;
            self.notifications.drain(..excess);
        }
    }

    pub fn refresh(&mut self) {
        match self.active_view {
            View::Board => self.refresh_board(),
            View::List => self.refresh_list(),
        }
    }

    pub fn refresh_board(&mut self) {
        let query = SearchQuery::text(self.query.text.clone());
        self.driver.load_board(&mut self.session, &query);
    }

    pub fn refresh_list(&mut self) {
        let query = self.list_query();
        let seq = self
            .driver
            .load_list(&query, self.list_view.ordering, self.list_view.request);
        self.list_view.begin(seq);
    }

    pub fn list_query(&self) -> SearchQuery {
        SearchQuery {
            text: self.query.text.clone(),
            stage: self.list_view.stage,
        }
    }

    // ------------------------------------------------------------------------
    // Board selection
    // ------------------------------------------------------------------------

    /// The card under the cursor and the stage it is displayed in.
    pub fn selected_card(&self) -> Option<(OpportunityId, Stage)> {
        let columns = self.session.project(self.board_view.order);
        let column = columns.get(self.board_view.column)?;
        column
            .cards
            .get(self.board_view.card)
            .map(|card| (card.id, column.stage))
    }

    fn column_len(&self, column: usize) -> usize {
        self.session
            .project(self.board_view.order)
            .get(column)
            .map(|c| c.len())
            .unwrap_or(0)
    }

    fn clamp_board_selection(&mut self) {
        self.board_view.column = self.board_view.column.min(Stage::COUNT - 1);
        let len = self.column_len(self.board_view.column);
        self.board_view.card = self.board_view.card.min(len.saturating_sub(1));
    }

    /// Put the cursor on `id`, wherever it is now displayed.
    fn focus_card(&mut self, id: OpportunityId) {
        let columns = self.session.project(self.board_view.order);
        for (column_index, column) in columns.iter().enumerate() {
            if let Some(card_index) = column.cards.iter().position(|card| card.id == id) {
                self.board_view.column = column_index;
                self.board_view.card = card_index;
                return;
            }
        }
    }

    // ------------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------------

    /// Apply a key action. Returns `true` when the app should exit.
    pub fn handle_action(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => return true,
            Action::NextView | Action::PrevView => {
                self.active_view = if action == Action::NextView {
                    self.active_view.next()
                } else {
                    self.active_view.previous()
                };
                if self.active_view == View::List && !self.list_view.requested() {
                    self.refresh_list();
                }
            }
            Action::ColumnLeft => {
                if self.active_view == View::Board {
                    self.board_view.column = self.board_view.column.saturating_sub(1);
                    self.clamp_board_selection();
                }
            }
            Action::ColumnRight => {
                if self.active_view == View::Board {
                    self.board_view.column += 1;
                    self.clamp_board_selection();
                }
            }
            Action::CardUp => match self.active_view {
                View::Board => self.board_view.card = self.board_view.card.saturating_sub(1),
                View::List => self.list_view.select_previous(),
            },
            Action::CardDown => match self.active_view {
                View::Board => {
                    self.board_view.card += 1;
                    self.clamp_board_selection();
                }
                View::List => self.list_view.select_next(),
            },
            Action::MovePrevStage | Action::MoveNextStage => {
                if let Some((_, stage)) = self.board_selection() {
                    let target = if action == Action::MoveNextStage {
                        stage.next()
                    } else {
                        stage.previous()
                    };
                    if let Some(target) = target {
                        self.move_selected(target);
                    }
                }
            }
            Action::BeginMoveTo => {
                if self.board_selection().is_some() {
                    self.input_mode = InputMode::MoveTarget;
                }
            }
            Action::MoveTo(stage) => {
                self.input_mode = InputMode::Normal;
                self.move_selected(stage);
            }
            Action::BeginDelete => {
                if let Some((id, stage)) = self.board_selection() {
                    self.delete_target = Some((id, stage));
                    self.input_mode = InputMode::ConfirmDelete;
                }
            }
            Action::Confirm => {
                self.input_mode = InputMode::Normal;
                if let Some((id, stage)) = self.delete_target.take() {
                    if let Err(err) = self.driver.request_delete(&mut self.session, id, stage) {
                        let notice = self.driver.handle_rejection(&mut self.session, &err);
                        self.push_notification(notice);
                    }
                    self.clamp_board_selection();
                }
            }
            Action::Cancel => {
                self.input_mode = InputMode::Normal;
                self.delete_target = None;
                self.search_input.clear();
            }
            Action::OpenSearch => {
                self.search_input = self.query.text.clone();
                self.input_mode = InputMode::Search;
            }
            Action::SearchInput(c) => self.search_input.push(c),
            Action::SearchBackspace => {
                self.search_input.pop();
            }
            Action::SubmitSearch => {
                self.input_mode = InputMode::Normal;
                self.query.text = std::mem::take(&mut self.search_input).trim().to_string();
                self.board_view.card = 0;
                self.list_view.request.page = 0;
                self.refresh_board();
                if self.active_view == View::List || self.list_view.requested() {
                    self.refresh_list();
                }
            }
            Action::CycleOrder => {
                self.board_view.order = next_projection(self.board_view.order);
                self.clamp_board_selection();
            }
            Action::PrevPage => {
                if self.active_view == View::List && self.list_view.request.page > 0 {
                    self.list_view.request.page -= 1;
                    self.refresh_list();
                }
            }
            Action::NextPage => {
                if self.active_view == View::List && self.list_view.has_next_page() {
                    self.list_view.request.page += 1;
                    self.refresh_list();
                }
            }
            Action::FlipSort => {
                if self.active_view == View::List {
                    let ordering = self.list_view.ordering;
                    self.list_view.ordering = Ordering::new(ordering.key, ordering.direction.flipped());
                    self.list_view.request.page = 0;
                    self.refresh_list();
                }
            }
            Action::CycleSortKey => {
                if self.active_view == View::List {
                    let ordering = self.list_view.ordering;
                    self.list_view.ordering = Ordering::new(ordering.key.next(), ordering.direction);
                    self.list_view.request.page = 0;
                    self.refresh_list();
                }
            }
            Action::CycleStageFilter => {
                if self.active_view == View::List {
                    self.list_view.stage = next_stage_filter(self.list_view.stage);
                    self.list_view.request.page = 0;
                    self.refresh_list();
                }
            }
            Action::Refresh => self.refresh(),
        }
        false
    }

    fn board_selection(&self) -> Option<(OpportunityId, Stage)> {
        if self.active_view == View::Board && self.session.status() == &BoardStatus::Ready {
            self.selected_card()
        } else {
            None
        }
    }

    fn move_selected(&mut self, target: Stage) {
        let Some((id, from)) = self.board_selection() else {
            return;
        };
        match self.driver.request_move(&mut self.session, id, from, target) {
            Ok(true) => self.focus_card(id),
            Ok(false) => {}
            Err(err) => {
                let notice = self.driver.handle_rejection(&mut self.session, &err);
                self.push_notification(notice);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Backend results and ticks
    // ------------------------------------------------------------------------

    pub fn handle_backend(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::List { seq, result } => {
                if let Some(message) = self.list_view.finish(seq, result) {
                    self.notify(NotificationLevel::Error, format!("Failed to load sales: {}", message));
                }
            }
            other => {
                if let Some(notice) = self.driver.apply(&mut self.session, other) {
                    self.push_notification(notice);
                }
                self.clamp_board_selection();
            }
        }
    }

    /// Periodic housekeeping: expire notifications and reconcile stats while
    /// the board is idle.
    pub fn on_tick(&mut self) {
        let now = chrono::Utc::now();
        let ttl = chrono::Duration::seconds(NOTIFICATION_TTL_SECS);
        self.notifications.retain(|n| !n.is_expired(now, ttl));

        if self.session.status() == &BoardStatus::Ready
            && !self.session.is_loading()
            && self.session.pending_count() == 0
        {
            self.driver.reload_stats(&mut self.session);
        }
    }
}

// ============================================================================
// VIEW STATE
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardViewState {
    pub column: usize,
    pub card: usize,
    pub order: ProjectionOrder,
}

#[derive(Debug, Clone)]
pub struct ListViewState {
    pub page: Page<Opportunity>,
    pub request: PageRequest,
    pub ordering: Ordering,
    pub stage: Option<Stage>,
    pub selected: usize,
    pub loading: bool,
    pub error: Option<String>,
    latest_seq: u64,
}

impl ListViewState {
    pub fn new(per_page: u32) -> Self {
        Self {
            page: Page::default(),
            request: PageRequest::first(per_page),
            ordering: Ordering::default(),
            stage: None,
            selected: 0,
            loading: false,
            error: None,
            latest_seq: 0,
        }
    }

    pub fn requested(&self) -> bool {
        self.latest_seq > 0
    }

    pub fn begin(&mut self, seq: u64) {
        self.latest_seq = seq;
        self.loading = true;
    }

    /// Apply a list result. Stale results are dropped. Returns the error
    /// message when the fetch failed.
    pub fn finish(&mut self, seq: u64, result: Result<Page<Opportunity>, String>) -> Option<String> {
        if seq != self.latest_seq {
            return None;
        }
        self.loading = false;
        match result {
            Ok(page) => {
                self.page = page;
                self.error = None;
                self.selected = self.selected.min(self.page.results.len().saturating_sub(1));
                None
            }
            Err(message) => {
                self.error = Some(message.clone());
                Some(message)
            }
        }
    }

    pub fn page_count(&self) -> u64 {
        self.page.page_count(self.request.per_page)
    }

    pub fn has_next_page(&self) -> bool {
        self.request.page + 1 < self.page_count()
    }

    pub fn selected_record(&self) -> Option<&Opportunity> {
        self.page.results.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.page.results.len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

/// Board ordering cycle for `f`.
pub fn next_projection(order: ProjectionOrder) -> ProjectionOrder {
    let by = |key, direction| ProjectionOrder::By(Ordering::new(key, direction));
    match order {
        ProjectionOrder::LastUpdated => by(SortKey::Amount, SortDirection::Descending),
        ProjectionOrder::By(Ordering { key: SortKey::Amount, .. }) => by(SortKey::Title, SortDirection::Ascending),
        ProjectionOrder::By(Ordering { key: SortKey::Title, .. }) => {
            by(SortKey::ExpectedCloseDate, SortDirection::Ascending)
        }
        ProjectionOrder::By(_) => ProjectionOrder::StoreOrder,
        ProjectionOrder::StoreOrder => ProjectionOrder::LastUpdated,
    }
}

pub fn projection_label(order: ProjectionOrder) -> String {
    match order {
        ProjectionOrder::LastUpdated => "recent".to_string(),
        ProjectionOrder::By(ordering) => ordering.to_string(),
        ProjectionOrder::StoreOrder => "arrival".to_string(),
    }
}

/// List stage filter cycle for `t`: all, then each stage in column order.
pub fn next_stage_filter(stage: Option<Stage>) -> Option<Stage> {
    match stage {
        None => Some(Stage::ALL[0]),
        Some(stage) => stage.next(),
    }
}
