//! Board driver tests against an in-memory backend.

mod common;

use common::{next_backend, stays_quiet, take_backend, InMemoryBackend};
use dealboard_core::{
    Amount, BoardError, BoardSession, BoardStatus, OpportunityId, Ordering,
    PageRequest, SearchQuery, SearchResult, Stage, ViewRequest,
};
use dealboard_test_utils::assertions::{assert_in_stage, assert_partition, assert_stats_match_board};
use dealboard_test_utils::fixtures::pipeline;
use dealboard_tui::driver::BoardDriver;
use dealboard_tui::events::{BackendEvent, TuiEvent};
use dealboard_tui::notifications::{Notification, NotificationAction, NotificationLevel};
use std::sync::Arc;
use tokio::sync::mpsc;

struct Harness {
    backend: Arc<InMemoryBackend>,
    driver: BoardDriver,
    session: BoardSession,
    rx: mpsc::Receiver<TuiEvent>,
}

fn harness(backend: InMemoryBackend) -> Harness {
    let backend = Arc::new(backend);
    let (tx, rx) = mpsc::channel(64);
    let driver = BoardDriver::new(backend.clone(), 20, tx);
    Harness {
        backend,
        driver,
        session: BoardSession::new(),
        rx,
    }
}

fn sample_backend() -> InMemoryBackend {
    InMemoryBackend::with_pipeline(pipeline(&[
        (1, Stage::New, 100),
        (2, Stage::Contacted, 250),
        (3, Stage::Won, 500),
        (4, Stage::New, 40),
    ]))
}

impl Harness {
    async fn load(&mut self) {
        self.driver.load_board(&mut self.session, &SearchQuery::default());
        self.apply_next(2).await;
    }

    async fn apply_next(&mut self, n: usize) -> Vec<Option<Notification>> {
        let mut notes = Vec::new();
        for event in take_backend(&mut self.rx, n).await {
            notes.push(self.driver.apply(&mut self.session, event));
        }
        notes
    }
}

// ============================================================================
// LOADING
// ============================================================================

#[tokio::test]
async fn load_populates_board_and_stats() {
    let mut h = harness(sample_backend());
    assert_eq!(h.session.status(), &BoardStatus::Loading);

    h.load().await;

    assert_eq!(h.session.status(), &BoardStatus::Ready);
    assert_eq!(h.session.store().len(), 4);
    assert_partition(h.session.store());
    assert_stats_match_board(&h.session);
    let stats = h.session.stats().unwrap();
    assert_eq!(stats.total_value, Amount::from_units(390));
    assert_eq!(stats.count(Stage::New), 2);
}

#[tokio::test]
async fn failed_pipeline_load_offers_retry() {
    let mut h = harness(sample_backend());
    h.backend.set_fail_pipeline(true);

    h.driver.load_board(&mut h.session, &SearchQuery::default());
    let notes = h.apply_next(2).await;

    assert!(matches!(h.session.status(), BoardStatus::Failed(message) if message.contains("pipeline unavailable")));
    let failure = notes
        .into_iter()
        .flatten()
        .find(|n| n.level == NotificationLevel::Error)
        .expect("load failure is reported");
    assert_eq!(failure.action, Some(NotificationAction::Retry));

    h.backend.set_fail_pipeline(false);
    h.driver.load_board(&mut h.session, &SearchQuery::default());
    assert_eq!(h.session.status(), &BoardStatus::Loading);
    h.apply_next(2).await;
    assert_eq!(h.session.status(), &BoardStatus::Ready);
}

#[tokio::test]
async fn board_search_ignores_stage_restriction() {
    let h = harness(sample_backend());
    let query = SearchQuery {
        text: "deal 2".to_string(),
        stage: Some(Stage::New),
    };

    let result = h.driver.gateway().search(&query, ViewRequest::Board).await.unwrap();

    let SearchResult::Board(payload) = result else {
        panic!("board request returned a list");
    };
    assert_eq!(payload.len(), 1);
    assert_eq!(payload.stage(Stage::Contacted)[0].id, OpportunityId(2));
}

#[tokio::test]
async fn list_load_applies_stage_filter_and_paging() {
    let mut h = harness(sample_backend());
    let query = SearchQuery {
        text: String::new(),
        stage: Some(Stage::New),
    };

    let seq = h
        .driver
        .load_list(&query, Ordering::default(), PageRequest { page: 0, per_page: 1 });

    match next_backend(&mut h.rx).await {
        BackendEvent::List { seq: got, result } => {
            assert_eq!(got, seq);
            let page = result.unwrap();
            assert_eq!(page.count, 2);
            assert_eq!(page.results.len(), 1);
            assert_eq!(page.results[0].stage, Stage::New);
        }
        other => panic!("expected a list result, got {:?}", other),
    }
}

// ============================================================================
// MOVES
// ============================================================================

#[tokio::test]
async fn confirmed_move_reconciles_stats() {
    let mut h = harness(sample_backend());
    h.load().await;

    let started = h
        .driver
        .request_move(&mut h.session, OpportunityId(1), Stage::New, Stage::Proposal)
        .unwrap();
    assert!(started);
    assert_in_stage(h.session.store(), 1, Stage::Proposal);
    assert!(h.session.is_pending(OpportunityId(1)));

    let notes = h.apply_next(1).await;
    let note = notes[0].as_ref().expect("confirmation is reported");
    assert_eq!(note.level, NotificationLevel::Success);
    assert!(note.message.contains("#1"));

    // Confirmation triggers a stats re-fetch.
    h.apply_next(1).await;
    assert_eq!(h.session.pending_count(), 0);
    assert_eq!(h.backend.stage_of(1), Some(Stage::Proposal));
    assert_stats_match_board(&h.session);
}

#[tokio::test]
async fn reconcile_keeps_closed_stages_out_of_pipeline_value() {
    let mut h = harness(sample_backend());
    h.load().await;

    h.driver
        .request_move(&mut h.session, OpportunityId(1), Stage::New, Stage::Won)
        .unwrap();
    h.apply_next(1).await;
    h.apply_next(1).await;

    let stats = h.session.stats().unwrap();
    assert_eq!(stats.count(Stage::Won), 2);
    assert_eq!(stats.total_value, Amount::from_units(290));
    assert_stats_match_board(&h.session);
}

#[tokio::test]
async fn reconcile_then_failure_of_other_move_restores_counts() {
    let mut h = harness(sample_backend());
    h.load().await;
    h.backend.fail_update(2);

    h.driver
        .request_move(&mut h.session, OpportunityId(1), Stage::New, Stage::Proposal)
        .unwrap();
    h.driver
        .request_move(&mut h.session, OpportunityId(2), Stage::Contacted, Stage::Won)
        .unwrap();

    let mut results = take_backend(&mut h.rx, 2).await;
    results.sort_by_key(|event| match event {
        BackendEvent::Intent { ticket, .. } => ticket.opportunity_id,
        _ => OpportunityId(i64::MAX),
    });
    let mut results = results.into_iter();
    let confirmed = results.next().unwrap();
    let refused = results.next().unwrap();

    // The confirmation's stats re-fetch lands while move #2 is still pending.
    h.driver.apply(&mut h.session, confirmed);
    h.apply_next(1).await;
    assert!(h.session.is_pending(OpportunityId(2)));
    assert_stats_match_board(&h.session);

    let note = h.driver.apply(&mut h.session, refused).expect("failure is reported");
    assert_eq!(note.level, NotificationLevel::Error);
    assert_in_stage(h.session.store(), 2, Stage::Contacted);
    assert_stats_match_board(&h.session);
    let stats = h.session.stats().unwrap();
    assert_eq!(stats.count(Stage::Won), 1);
    assert_eq!(stats.count(Stage::Proposal), 1);
    assert_eq!(stats.total_value, Amount::from_units(390));
}

#[tokio::test]
async fn rejected_move_rolls_back() {
    let mut h = harness(sample_backend());
    h.load().await;
    h.backend.fail_update(1);
    let lane_before = h.session.store().lane(Stage::New).to_vec();
    let stats_before = h.session.stats().cloned();

    h.driver
        .request_move(&mut h.session, OpportunityId(1), Stage::New, Stage::Won)
        .unwrap();
    assert_eq!(h.session.stats().unwrap().count(Stage::Won), 2);

    let notes = h.apply_next(1).await;
    let note = notes[0].as_ref().expect("failure is reported");
    assert_eq!(note.level, NotificationLevel::Error);
    assert!(note.message.contains("status update refused"));

    assert_eq!(h.session.store().lane(Stage::New), lane_before.as_slice());
    assert_eq!(h.session.stats().cloned(), stats_before);
    assert_partition(h.session.store());
    assert!(stays_quiet(&mut h.rx).await);
}

#[tokio::test]
async fn same_stage_move_sends_nothing() {
    let mut h = harness(sample_backend());
    h.load().await;

    let started = h
        .driver
        .request_move(&mut h.session, OpportunityId(2), Stage::Contacted, Stage::Contacted)
        .unwrap();

    assert!(!started);
    assert_eq!(h.session.pending_count(), 0);
    assert!(stays_quiet(&mut h.rx).await);
}

#[tokio::test]
async fn second_move_while_pending_is_busy() {
    let mut h = harness(sample_backend());
    h.load().await;
    h.driver
        .request_move(&mut h.session, OpportunityId(1), Stage::New, Stage::Contacted)
        .unwrap();

    let err = h
        .driver
        .request_move(&mut h.session, OpportunityId(1), Stage::Contacted, Stage::Proposal)
        .unwrap_err();

    assert!(matches!(err, BoardError::Busy { .. }));
    let note = h.driver.handle_rejection(&mut h.session, &err);
    assert_eq!(note.level, NotificationLevel::Info);
    assert!(!h.session.is_loading());
}

#[tokio::test]
async fn stale_move_reloads_board() {
    let mut h = harness(sample_backend());
    h.load().await;
    h.backend.set_stage(1, Stage::Negotiation);

    let err = h
        .driver
        .request_move(&mut h.session, OpportunityId(1), Stage::Contacted, Stage::Proposal)
        .unwrap_err();
    assert!(matches!(err, BoardError::StaleMembership { .. }));
    assert_in_stage(h.session.store(), 1, Stage::New);

    let note = h.driver.handle_rejection(&mut h.session, &err);
    assert_eq!(note.level, NotificationLevel::Warning);
    assert!(h.session.is_loading());

    h.apply_next(2).await;
    assert_in_stage(h.session.store(), 1, Stage::Negotiation);
    assert_stats_match_board(&h.session);
}

#[tokio::test]
async fn reload_during_flight_supersedes_move() {
    let mut h = harness(sample_backend());
    h.load().await;

    h.driver
        .request_move(&mut h.session, OpportunityId(1), Stage::New, Stage::Contacted)
        .unwrap();
    h.driver.load_board(&mut h.session, &SearchQuery::default());

    let mut events = take_backend(&mut h.rx, 3).await;
    events.sort_by_key(|event| matches!(event, BackendEvent::Intent { .. }));
    for event in events {
        let note = h.driver.apply(&mut h.session, event);
        assert!(note.as_ref().map_or(true, |n| n.level != NotificationLevel::Error));
    }

    // The late confirmation asks for a fresh board instead of trusting itself.
    assert!(h.session.is_loading());
    h.apply_next(2).await;
    assert_eq!(h.session.pending_count(), 0);
    assert_in_stage(h.session.store(), 1, Stage::Contacted);
    assert_stats_match_board(&h.session);
}

#[tokio::test]
async fn closed_session_discards_late_results() {
    let mut h = harness(sample_backend());
    h.load().await;
    h.driver
        .request_move(&mut h.session, OpportunityId(1), Stage::New, Stage::Contacted)
        .unwrap();

    h.session.close();
    let notes = h.apply_next(1).await;

    assert!(notes[0].is_none());
    assert!(stays_quiet(&mut h.rx).await);
    let err = h
        .driver
        .request_move(&mut h.session, OpportunityId(2), Stage::Contacted, Stage::Won)
        .unwrap_err();
    assert!(matches!(err, BoardError::SessionClosed));
}

// ============================================================================
// DELETES
// ============================================================================

#[tokio::test]
async fn confirmed_delete_updates_counts() {
    let mut h = harness(sample_backend());
    h.load().await;

    h.driver
        .request_delete(&mut h.session, OpportunityId(2), Stage::Contacted)
        .unwrap();
    assert!(!h.session.store().contains(OpportunityId(2)));

    let notes = h.apply_next(1).await;
    assert_eq!(notes[0].as_ref().map(|n| n.level), Some(NotificationLevel::Success));
    h.apply_next(1).await;

    assert_eq!(h.session.stats().unwrap().count(Stage::Contacted), 0);
    assert_stats_match_board(&h.session);
}

#[tokio::test]
async fn failed_delete_restores_card_in_place() {
    let mut h = harness(sample_backend());
    h.load().await;
    h.backend.fail_delete(4);
    let lane_before = h.session.store().lane(Stage::New).to_vec();

    h.driver
        .request_delete(&mut h.session, OpportunityId(4), Stage::New)
        .unwrap();
    let notes = h.apply_next(1).await;

    assert_eq!(notes[0].as_ref().map(|n| n.level), Some(NotificationLevel::Error));
    assert_eq!(h.session.store().lane(Stage::New), lane_before.as_slice());
    assert_stats_match_board(&h.session);
}
