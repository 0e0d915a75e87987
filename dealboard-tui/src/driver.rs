//! Session driver: runs remote calls for a [`BoardSession`] and feeds the
//! results back through the event channel.
//!
//! All session mutation happens on the loop task. Spawned tasks only talk to
//! the backend and send a [`BackendEvent`] when done.

use crate::events::{BackendEvent, TuiEvent};
use crate::gateway::SearchGateway;
use crate::notifications::{Notification, NotificationAction, NotificationLevel};
use crate::traits::SalesBackend;
use dealboard_core::{
    BoardError, BoardResult, BoardSession, DiscardReason, IntentKind, LoadOutcome, Ordering,
    Outcome, PageRequest, Resolution, SearchQuery, SearchResult, Stage, ViewRequest, OpportunityId,
};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct BoardDriver {
    backend: Arc<dyn SalesBackend>,
    gateway: SearchGateway,
    events: mpsc::Sender<TuiEvent>,
    query: SearchQuery,
    list_seq: u64,
}

impl BoardDriver {
    pub fn new(backend: Arc<dyn SalesBackend>, page_size: u32, events: mpsc::Sender<TuiEvent>) -> Self {
        let gateway = SearchGateway::new(Arc::clone(&backend), page_size);
        Self {
            backend,
            gateway,
            events,
            query: SearchQuery::default(),
            list_seq: 0,
        }
    }

    pub fn gateway(&self) -> &SearchGateway {
        &self.gateway
    }

    /// Query used by the most recent board load.
    pub fn board_query(&self) -> &SearchQuery {
        &self.query
    }

    // ------------------------------------------------------------------------
    // Fetches
    // ------------------------------------------------------------------------

    /// Fetch the pipeline and the stats for `query`.
    pub fn load_board(&mut self, session: &mut BoardSession, query: &SearchQuery) {
        self.query = query.clone();
        session.set_filter(query.text.clone());
        let ticket = session.begin_load();
        let gateway = self.gateway.clone();
        let query = query.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = match gateway.search(&query, ViewRequest::Board).await {
                Ok(SearchResult::Board(payload)) => Ok(payload),
                Ok(SearchResult::List(_)) => Err("Unexpected list response".to_string()),
                Err(err) => Err(err.user_message()),
            };
            deliver(&events, BackendEvent::Pipeline { ticket, result }).await;
        });
        self.reload_stats(session);
    }

    /// Replace local counters with a fresh fetch.
    pub fn reload_stats(&self, session: &mut BoardSession) {
        let ticket = session.begin_stats_reload();
        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = backend.fetch_stats().await.map_err(|err| err.user_message());
            deliver(&events, BackendEvent::Stats { ticket, result }).await;
        });
    }

    /// Fetch one list page. Returns the sequence number the result will carry.
    pub fn load_list(&mut self, query: &SearchQuery, ordering: Ordering, page: PageRequest) -> u64 {
        self.list_seq += 1;
        let seq = self.list_seq;
        let gateway = self.gateway.clone();
        let query = query.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = match gateway.search(&query, ViewRequest::List { ordering, page }).await {
                Ok(SearchResult::List(page)) => Ok(page),
                Ok(SearchResult::Board(_)) => Err("Unexpected board response".to_string()),
                Err(err) => Err(err.user_message()),
            };
            deliver(&events, BackendEvent::List { seq, result }).await;
        });
        seq
    }

    // ------------------------------------------------------------------------
    // Intents
    // ------------------------------------------------------------------------

    /// Apply a move locally and send it to the backend.
    ///
    /// `Ok(false)` means nothing happened (same-stage drop).
    pub fn request_move(
        &self,
        session: &mut BoardSession,
        id: OpportunityId,
        from: Stage,
        to: Stage,
    ) -> BoardResult<bool> {
        let Some(ticket) = session.begin_move(id, from, to)? else {
            return Ok(false);
        };
        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = match backend.update_status(id, to).await {
                Ok(()) => Outcome::Confirmed,
                Err(err) => Outcome::Failed(err.user_message()),
            };
            deliver(&events, BackendEvent::Intent { ticket, outcome }).await;
        });
        Ok(true)
    }

    /// Remove a card locally and ask the backend to delete it.
    pub fn request_delete(&self, session: &mut BoardSession, id: OpportunityId, stage: Stage) -> BoardResult<()> {
        let ticket = session.begin_delete(id, stage)?;
        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = match backend.delete_sale(id).await {
                Ok(()) => Outcome::Confirmed,
                Err(err) => Outcome::Failed(err.user_message()),
            };
            deliver(&events, BackendEvent::Intent { ticket, outcome }).await;
        });
        Ok(())
    }

    /// Turn a refused intent into a notification, reloading when the local
    /// board is known to be out of date.
    pub fn handle_rejection(&mut self, session: &mut BoardSession, err: &BoardError) -> Notification {
        if err.requires_reload() {
            tracing::warn!(error = %err, "Board out of date, reloading");
            let query = self.query.clone();
            self.load_board(session, &query);
            return Notification::new(NotificationLevel::Warning, format!("{}. Reloading board.", err));
        }
        Notification::new(NotificationLevel::Info, err.to_string())
    }

    // ------------------------------------------------------------------------
    // Results
    // ------------------------------------------------------------------------

    /// Apply a board-side backend result. List results belong to the list
    /// view and are ignored here.
    pub fn apply(&mut self, session: &mut BoardSession, event: BackendEvent) -> Option<Notification> {
        match event {
            BackendEvent::Pipeline { ticket, result } => match session.finish_load(ticket, result) {
                LoadOutcome::Applied(report) if !report.dropped_duplicates.is_empty() => Some(Notification::new(
                    NotificationLevel::Warning,
                    format!(
                        "Ignored {} duplicate opportunities in pipeline response",
                        report.dropped_duplicates.len()
                    ),
                )),
                LoadOutcome::Applied(_) | LoadOutcome::Discarded => None,
                LoadOutcome::Failed => Some(
                    Notification::new(NotificationLevel::Error, "Failed to load pipeline")
                        .with_action(NotificationAction::Retry),
                ),
            },
            BackendEvent::Stats { ticket, result } => {
                let failure = result.as_ref().err().cloned();
                session.finish_stats_reload(ticket, result);
                failure.map(|message| {
                    Notification::new(NotificationLevel::Warning, format!("Stats refresh failed: {}", message))
                })
            }
            BackendEvent::Intent { ticket, outcome } => {
                let resolution = session.resolve(ticket, outcome);
                self.after_resolution(session, resolution)
            }
            BackendEvent::List { seq, .. } => {
                tracing::debug!(seq, "List result routed to board driver, ignoring");
                None
            }
        }
    }

    fn after_resolution(&mut self, session: &mut BoardSession, resolution: Resolution) -> Option<Notification> {
        match resolution {
            Resolution::Confirmed {
                opportunity_id,
                kind: IntentKind::Move { to, .. },
                reload_stats,
            } => {
                if reload_stats {
                    self.reload_stats(session);
                }
                Some(Notification::new(
                    NotificationLevel::Success,
                    format!("Moved #{} to {}", opportunity_id, to.label()),
                ))
            }
            Resolution::Confirmed {
                opportunity_id,
                kind: IntentKind::Delete { .. },
                ..
            } => {
                self.reload_stats(session);
                Some(Notification::new(
                    NotificationLevel::Success,
                    format!("Deleted #{}", opportunity_id),
                ))
            }
            Resolution::Reverted {
                opportunity_id,
                kind,
                reason,
            } => {
                let what = match kind {
                    IntentKind::Move { to, .. } => format!("move #{} to {}", opportunity_id, to.label()),
                    IntentKind::Delete { .. } => format!("delete #{}", opportunity_id),
                };
                Some(Notification::new(
                    NotificationLevel::Error,
                    format!("Could not {}: {}", what, reason),
                ))
            }
            Resolution::Discarded {
                opportunity_id,
                reason: DiscardReason::Superseded,
            } => {
                if !session.is_closed() {
                    tracing::debug!(%opportunity_id, "Late result after reload, refreshing board");
                    let query = self.query.clone();
                    self.load_board(session, &query);
                }
                None
            }
            Resolution::Discarded { .. } => None,
        }
    }
}

async fn deliver(events: &mpsc::Sender<TuiEvent>, event: BackendEvent) {
    if events.send(TuiEvent::Backend(event)).await.is_err() {
        tracing::debug!("Event loop gone, dropping backend result");
    }
}
