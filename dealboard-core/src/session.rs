//! Board session: the state container behind one pipeline board.
//!
//! Owns the opportunity store, the stats aggregator and the intents in
//! flight. Everything here is synchronous; the caller runs the remote calls
//! and feeds their outcomes back through [`BoardSession::resolve`].

use crate::amount::Amount;
use crate::entities::{OpportunityId, PipelinePayload};
use crate::enums::Stage;
use crate::error::{BoardError, BoardResult};
use crate::intent::{
    DeleteIntent, DeleteSnapshot, DiscardReason, Epoch, IntentId, IntentKind, IntentPhase,
    IntentTicket, MoveIntent, MoveSnapshot, Outcome, PendingIntent, Resolution,
};
use crate::projector::{projected_stages, ProjectedColumn, ProjectionOrder};
use crate::stats::{ReloadTicket, Stats, StatsAggregator};
use crate::store::{LoadReport, OpportunityStore};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardStatus {
    /// Nothing loaded yet.
    Loading,
    Ready,
    /// The last pipeline fetch failed; the board is replaced by this message.
    Failed(String),
}

/// Ticket for an in-flight pipeline fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    seq: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied(LoadReport),
    Failed,
    /// A newer fetch was started, or the session is closed.
    Discarded,
}

#[derive(Debug, Clone)]
pub struct BoardSession {
    store: OpportunityStore,
    stats: StatsAggregator,
    pending: HashMap<OpportunityId, PendingIntent>,
    status: BoardStatus,
    loading: bool,
    filter: String,
    epoch: u64,
    next_intent: u64,
    load_seq: u64,
    closed: bool,
    reconcile_after_move: bool,
}

impl Default for BoardSession {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardSession {
    pub fn new() -> Self {
        Self {
            store: OpportunityStore::new(),
            stats: StatsAggregator::new(),
            pending: HashMap::new(),
            status: BoardStatus::Loading,
            loading: false,
            filter: String::new(),
            epoch: 0,
            next_intent: 0,
            load_seq: 0,
            closed: false,
            reconcile_after_move: true,
        }
    }

    /// Whether a confirmed move asks for a background stats re-fetch.
    pub fn with_reconcile_after_move(mut self, enabled: bool) -> Self {
        self.reconcile_after_move = enabled;
        self
    }

    pub fn store(&self) -> &OpportunityStore {
        &self.store
    }

    pub fn stats(&self) -> Option<&Stats> {
        self.stats.current()
    }

    pub fn status(&self) -> &BoardStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn epoch(&self) -> Epoch {
        Epoch(self.epoch)
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
    }

    pub fn project(&self, order: ProjectionOrder) -> Vec<ProjectedColumn<'_>> {
        projected_stages(&self.store, &self.filter, order)
    }

    pub fn is_pending(&self, id: OpportunityId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn pending(&self, id: OpportunityId) -> Option<&PendingIntent> {
        self.pending.get(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    // ------------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------------

    pub fn begin_load(&mut self) -> LoadTicket {
        self.load_seq += 1;
        self.loading = true;
        if matches!(self.status, BoardStatus::Failed(_)) {
            self.status = BoardStatus::Loading;
        }
        LoadTicket { seq: self.load_seq }
    }

    /// Apply a pipeline fetch result.
    ///
    /// A successful load replaces the store wholesale and starts a new epoch,
    /// so outcomes of intents started before it are discarded.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<PipelinePayload, String>) -> LoadOutcome {
        if self.closed || ticket.seq != self.load_seq {
            tracing::debug!(ticket = ticket.seq, latest = self.load_seq, "Dropping superseded pipeline load");
            return LoadOutcome::Discarded;
        }
        self.loading = false;
        match result {
            Ok(payload) => {
                if !self.pending.is_empty() {
                    tracing::warn!(count = self.pending.len(), "Full load discards in-flight intents");
                }
                let report = self.store.load(payload);
                self.pending.clear();
                let value = self.confirmed_pipeline_value();
                self.stats.set_pipeline_value(value);
                self.epoch += 1;
                self.status = BoardStatus::Ready;
                tracing::info!(loaded = report.loaded, epoch = self.epoch, "Pipeline loaded");
                LoadOutcome::Applied(report)
            }
            Err(message) => {
                tracing::error!(error = %message, "Pipeline load failed");
                self.status = BoardStatus::Failed(message);
                LoadOutcome::Failed
            }
        }
    }

    pub fn begin_stats_reload(&mut self) -> ReloadTicket {
        self.stats.begin_reload()
    }

    /// Apply a stats fetch. Failures keep the last known counters.
    ///
    /// Fetched counts become the new base and the moves still in flight are
    /// re-applied on top of it. Pipeline value is always taken from the board,
    /// since the backend's `total_value` also sums closed stages.
    pub fn finish_stats_reload(&mut self, ticket: ReloadTicket, result: Result<Stats, String>) -> bool {
        if self.closed {
            return false;
        }
        match result {
            Ok(mut stats) => {
                stats.total_value = self.confirmed_pipeline_value();
                if !self.stats.finish_reload(ticket, stats) {
                    return false;
                }
                self.rebase_pending_moves();
                true
            }
            Err(message) => {
                tracing::error!(error = %message, "Stats reload failed");
                false
            }
        }
    }

    // ------------------------------------------------------------------------
    // Intents
    // ------------------------------------------------------------------------

    /// Start a stage move.
    ///
    /// Returns `Ok(None)` for a same-stage drop, which is not an intent. On
    /// success the move is already visible in the store and stats.
    pub fn begin_move(&mut self, id: OpportunityId, from: Stage, to: Stage) -> BoardResult<Option<IntentTicket>> {
        if self.closed {
            return Err(BoardError::SessionClosed);
        }
        if from == to {
            return Ok(None);
        }
        if self.pending.contains_key(&id) {
            return Err(BoardError::Busy { id });
        }
        let record = self.member(id, from)?.clone();

        let intent_id = self.allocate_intent();
        let mut intent = MoveIntent {
            id: intent_id,
            opportunity_id: id,
            from_stage: from,
            to_stage: to,
            phase: IntentPhase::PendingLocal,
            snapshot_before: MoveSnapshot {
                from_lane: self.store.lane(from).to_vec(),
                to_lane: self.store.lane(to).to_vec(),
                stats_before: self.stats.current().cloned(),
                from_index: 0,
                stats_delta: Default::default(),
                lane_revisions: (0, 0),
                stats_revision: 0,
                record,
            },
        };

        let from_index = self.store.move_stage(id, from, to)?;
        let delta = self
            .stats
            .adjust_for_move(from, to, intent.snapshot_before.record.amount);

        let snapshot = &mut intent.snapshot_before;
        snapshot.from_index = from_index;
        snapshot.stats_delta = delta;
        snapshot.lane_revisions = (self.store.revision(from), self.store.revision(to));
        snapshot.stats_revision = self.stats.revision();
        intent.phase = IntentPhase::Confirming;

        tracing::debug!(%id, from = %from, to = %to, intent = %intent_id, "Move applied optimistically");
        self.pending.insert(id, PendingIntent::Move(intent));
        Ok(Some(IntentTicket {
            intent: intent_id,
            epoch: self.epoch(),
            opportunity_id: id,
            kind: IntentKind::Move { from, to },
        }))
    }

    /// Start a delete. The card disappears immediately; stats wait for confirmation.
    pub fn begin_delete(&mut self, id: OpportunityId, stage: Stage) -> BoardResult<IntentTicket> {
        if self.closed {
            return Err(BoardError::SessionClosed);
        }
        if self.pending.contains_key(&id) {
            return Err(BoardError::Busy { id });
        }
        self.member(id, stage)?;

        let lane = self.store.lane(stage).to_vec();
        let (index, record) = self
            .store
            .remove(id, stage)
            .ok_or(BoardError::NotFound { id })?;

        let intent_id = self.allocate_intent();
        let intent = DeleteIntent {
            id: intent_id,
            opportunity_id: id,
            stage,
            phase: IntentPhase::Confirming,
            snapshot_before: DeleteSnapshot {
                record,
                index,
                lane,
                lane_revision: self.store.revision(stage),
            },
        };

        tracing::debug!(%id, stage = %stage, intent = %intent_id, "Delete applied optimistically");
        self.pending.insert(id, PendingIntent::Delete(intent));
        Ok(IntentTicket {
            intent: intent_id,
            epoch: self.epoch(),
            opportunity_id: id,
            kind: IntentKind::Delete { stage },
        })
    }

    /// Apply the backend's verdict on an intent.
    pub fn resolve(&mut self, ticket: IntentTicket, outcome: Outcome) -> Resolution {
        let id = ticket.opportunity_id;
        if self.closed {
            tracing::debug!(%id, "Dropping resolution for closed board");
            return Resolution::Discarded { opportunity_id: id, reason: DiscardReason::Closed };
        }
        if ticket.epoch != self.epoch() {
            tracing::warn!(%id, intent = %ticket.intent, "Dropping resolution from an earlier load");
            return Resolution::Discarded { opportunity_id: id, reason: DiscardReason::Superseded };
        }
        let pending = match self.pending.remove(&id) {
            Some(pending) if pending.id() == ticket.intent => pending,
            Some(other) => {
                self.pending.insert(id, other);
                return Resolution::Discarded { opportunity_id: id, reason: DiscardReason::Unknown };
            }
            None => return Resolution::Discarded { opportunity_id: id, reason: DiscardReason::Unknown },
        };

        match (pending, outcome) {
            (PendingIntent::Move(mut intent), Outcome::Confirmed) => {
                intent.phase = IntentPhase::Confirmed;
                tracing::debug!(%id, to = %intent.to_stage, "Move confirmed");
                Resolution::Confirmed {
                    opportunity_id: id,
                    kind: ticket.kind,
                    reload_stats: self.reconcile_after_move,
                }
            }
            (PendingIntent::Move(mut intent), Outcome::Failed(reason)) => {
                self.revert_move(&intent);
                intent.phase = IntentPhase::Reverted;
                tracing::warn!(%id, from = %intent.from_stage, to = %intent.to_stage, error = %reason, "Move reverted");
                Resolution::Reverted { opportunity_id: id, kind: ticket.kind, reason }
            }
            (PendingIntent::Delete(mut intent), Outcome::Confirmed) => {
                let snapshot = &intent.snapshot_before;
                self.stats.adjust_for_delete(intent.stage, snapshot.record.amount);
                intent.phase = IntentPhase::Confirmed;
                tracing::debug!(%id, "Delete confirmed");
                Resolution::Confirmed { opportunity_id: id, kind: ticket.kind, reload_stats: true }
            }
            (PendingIntent::Delete(mut intent), Outcome::Failed(reason)) => {
                self.revert_delete(&intent);
                intent.phase = IntentPhase::Reverted;
                tracing::warn!(%id, stage = %intent.stage, error = %reason, "Delete reverted");
                Resolution::Reverted { opportunity_id: id, kind: ticket.kind, reason }
            }
        }
    }

    /// Tear the board down. Outstanding resolutions become no-ops.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        tracing::debug!(pending = self.pending.len(), "Board session closed");
        self.closed = true;
        self.epoch += 1;
        self.pending.clear();
        self.loading = false;
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn member(&self, id: OpportunityId, stage: Stage) -> BoardResult<&crate::entities::Opportunity> {
        match self.store.stage_of(id) {
            None => Err(BoardError::NotFound { id }),
            Some(actual) if actual != stage => Err(BoardError::StaleMembership {
                id,
                expected: stage,
                actual: Some(actual),
            }),
            Some(_) => self.store.get(id).ok_or(BoardError::NotFound { id }),
        }
    }

    fn allocate_intent(&mut self) -> IntentId {
        self.next_intent += 1;
        IntentId(self.next_intent)
    }

    /// Open-stage value of the board with in-flight intents undone.
    fn confirmed_pipeline_value(&self) -> Amount {
        let mut value = Amount::ZERO;
        for (stage, lane) in self.store.lanes() {
            for card in lane {
                let stage = match self.pending.get(&card.id) {
                    Some(PendingIntent::Move(intent)) => intent.from_stage,
                    _ => stage,
                };
                if stage.is_open() {
                    value = value.saturating_add(card.amount);
                }
            }
        }
        for pending in self.pending.values() {
            if let PendingIntent::Delete(intent) = pending {
                if intent.stage.is_open() {
                    value = value.saturating_add(intent.snapshot_before.record.amount);
                }
            }
        }
        value
    }

    /// Re-apply every in-flight move on top of freshly fetched counters and
    /// record the new deltas, so a later rollback undoes exactly what it added.
    fn rebase_pending_moves(&mut self) {
        for pending in self.pending.values_mut() {
            let PendingIntent::Move(intent) = pending else {
                continue;
            };
            let snapshot = &mut intent.snapshot_before;
            snapshot.stats_before = self.stats.current().cloned();
            snapshot.stats_delta = self
                .stats
                .adjust_for_move(intent.from_stage, intent.to_stage, snapshot.record.amount);
            snapshot.stats_revision = self.stats.revision();
        }
    }

    fn revert_move(&mut self, intent: &MoveIntent) {
        let snapshot = &intent.snapshot_before;
        let (from, to) = (intent.from_stage, intent.to_stage);
        let untouched = (self.store.revision(from), self.store.revision(to)) == snapshot.lane_revisions;

        if untouched {
            self.store.replace_lane(from, snapshot.from_lane.clone());
            self.store.replace_lane(to, snapshot.to_lane.clone());
        } else if self.store.remove(intent.opportunity_id, to).is_some() {
            if let Err(err) = self
                .store
                .restore(from, snapshot.from_index, snapshot.record.clone())
            {
                tracing::error!(error = %err, "Rollback could not restore card");
            }
        } else {
            tracing::error!(id = %intent.opportunity_id, stage = %to, "Rollback found card outside its target stage");
        }

        if self.stats.revision() == snapshot.stats_revision {
            self.stats.restore(snapshot.stats_before.clone());
        } else {
            self.stats.revert(&snapshot.stats_delta);
        }
    }

    fn revert_delete(&mut self, intent: &DeleteIntent) {
        let snapshot = &intent.snapshot_before;
        if self.store.revision(intent.stage) == snapshot.lane_revision {
            self.store.replace_lane(intent.stage, snapshot.lane.clone());
        } else if let Err(err) = self
            .store
            .restore(intent.stage, snapshot.index, snapshot.record.clone())
        {
            tracing::error!(error = %err, "Rollback could not restore deleted card");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Opportunity;

    fn ready_session(cards: Vec<Opportunity>) -> BoardSession {
        let mut session = BoardSession::new();
        let ticket = session.begin_load();
        let payload: PipelinePayload = cards.into_iter().collect();
        let derived = Stats::derive_from(&OpportunityStore::from_payload(payload.clone()));
        assert!(matches!(session.finish_load(ticket, Ok(payload)), LoadOutcome::Applied(_)));
        let reload = session.begin_stats_reload();
        assert!(session.finish_stats_reload(reload, Ok(derived)));
        session
    }

    fn card(id: i64, stage: Stage, units: i64) -> Opportunity {
        Opportunity::new(id, format!("deal {id}"), stage).with_amount(Amount::from_units(units))
    }

    #[test]
    fn confirmed_move_matches_worked_example() {
        let mut session = ready_session(vec![card(1, Stage::New, 1000)]);
        assert_eq!(session.stats().unwrap().total_value, Amount::from_units(1000));

        let ticket = session
            .begin_move(OpportunityId(1), Stage::New, Stage::Won)
            .unwrap()
            .unwrap();
        assert_eq!(
            session.pending(OpportunityId(1)).map(PendingIntent::phase),
            Some(IntentPhase::Confirming)
        );
        let resolution = session.resolve(ticket, Outcome::Confirmed);
        assert_eq!(resolution.phase(), Some(IntentPhase::Confirmed));

        assert!(session.store().lane(Stage::New).is_empty());
        assert_eq!(session.store().lane(Stage::Won)[0].id, OpportunityId(1));
        let stats = session.stats().unwrap();
        assert_eq!(stats.count(Stage::New), 0);
        assert_eq!(stats.count(Stage::Won), 1);
        assert_eq!(stats.total_value, Amount::ZERO);
        assert!(!session.is_pending(OpportunityId(1)));
    }

    #[test]
    fn same_stage_drop_is_not_an_intent() {
        let mut session = ready_session(vec![card(1, Stage::New, 10)]);
        let before = session.store().clone();
        assert_eq!(session.begin_move(OpportunityId(1), Stage::New, Stage::New), Ok(None));
        assert_eq!(session.store(), &before);
        assert_eq!(session.pending_count(), 0);
    }

    #[test]
    fn second_intent_on_busy_card_is_rejected() {
        let mut session = ready_session(vec![card(1, Stage::New, 10)]);
        session
            .begin_move(OpportunityId(1), Stage::New, Stage::Contacted)
            .unwrap();
        assert_eq!(
            session.begin_move(OpportunityId(1), Stage::Contacted, Stage::Proposal),
            Err(BoardError::Busy { id: OpportunityId(1) })
        );
        assert_eq!(
            session.begin_delete(OpportunityId(1), Stage::Contacted),
            Err(BoardError::Busy { id: OpportunityId(1) })
        );
    }

    #[test]
    fn resolution_after_close_is_discarded() {
        let mut session = ready_session(vec![card(1, Stage::New, 10)]);
        let ticket = session
            .begin_move(OpportunityId(1), Stage::New, Stage::Lost)
            .unwrap()
            .unwrap();
        session.close();
        let store_before = session.store().clone();
        let stats_before = session.stats().cloned();
        let resolution = session.resolve(ticket, Outcome::Failed("timeout".into()));
        assert_eq!(
            resolution,
            Resolution::Discarded { opportunity_id: OpportunityId(1), reason: DiscardReason::Closed }
        );
        assert_eq!(session.store(), &store_before);
        assert_eq!(session.stats().cloned(), stats_before);
        assert_eq!(
            session.begin_move(OpportunityId(1), Stage::Lost, Stage::New),
            Err(BoardError::SessionClosed)
        );
    }

    #[test]
    fn full_load_supersedes_in_flight_intents() {
        let mut session = ready_session(vec![card(1, Stage::New, 10)]);
        let ticket = session
            .begin_move(OpportunityId(1), Stage::New, Stage::Won)
            .unwrap()
            .unwrap();
        let load = session.begin_load();
        session.finish_load(load, Ok([card(1, Stage::New, 10)].into_iter().collect()));
        let resolution = session.resolve(ticket, Outcome::Failed("conflict".into()));
        assert!(matches!(
            resolution,
            Resolution::Discarded { reason: DiscardReason::Superseded, .. }
        ));
        assert_eq!(session.store().stage_of(OpportunityId(1)), Some(Stage::New));
        assert!(!session.is_pending(OpportunityId(1)));
    }

    #[test]
    fn failed_load_sets_error_state_and_retry_clears_it() {
        let mut session = BoardSession::new();
        let ticket = session.begin_load();
        assert_eq!(session.finish_load(ticket, Err("502".into())), LoadOutcome::Failed);
        assert_eq!(session.status(), &BoardStatus::Failed("502".into()));
        let retry = session.begin_load();
        assert_eq!(session.status(), &BoardStatus::Loading);
        session.finish_load(retry, Ok(PipelinePayload::empty()));
        assert_eq!(session.status(), &BoardStatus::Ready);
    }

    #[test]
    fn older_load_response_is_ignored() {
        let mut session = BoardSession::new();
        let first = session.begin_load();
        let second = session.begin_load();
        session.finish_load(second, Ok([card(2, Stage::New, 1)].into_iter().collect()));
        assert_eq!(
            session.finish_load(first, Ok([card(1, Stage::New, 1)].into_iter().collect())),
            LoadOutcome::Discarded
        );
        assert!(session.store().contains(OpportunityId(2)));
        assert!(!session.store().contains(OpportunityId(1)));
    }

    #[test]
    fn confirmed_delete_adjusts_stats_and_requests_reload() {
        let mut session = ready_session(vec![card(1, Stage::New, 40), card(2, Stage::New, 60)]);
        let ticket = session.begin_delete(OpportunityId(1), Stage::New).unwrap();
        assert!(!session.store().contains(OpportunityId(1)));
        assert_eq!(session.stats().unwrap().count(Stage::New), 2);
        let resolution = session.resolve(ticket, Outcome::Confirmed);
        assert!(matches!(resolution, Resolution::Confirmed { reload_stats: true, .. }));
        let stats = session.stats().unwrap();
        assert_eq!(stats.count(Stage::New), 1);
        assert_eq!(stats.total_count, 1);
        assert_eq!(stats.total_value, Amount::from_units(60));
    }

    #[test]
    fn failed_delete_restores_card_in_place() {
        let mut session = ready_session(vec![
            card(1, Stage::New, 1),
            card(2, Stage::New, 2),
            card(3, Stage::New, 3),
        ]);
        let before = session.store().clone();
        let ticket = session.begin_delete(OpportunityId(2), Stage::New).unwrap();
        session.resolve(ticket, Outcome::Failed("403".into()));
        assert_eq!(session.store(), &before);
    }
    /// Counters as the backend reports them: `total_value` sums every stage.
    fn server_stats(cards: &[Opportunity]) -> Stats {
        let payload: PipelinePayload = cards.iter().cloned().collect();
        let mut stats = Stats::derive_from(&OpportunityStore::from_payload(payload));
        stats.total_value = cards.iter().map(|c| c.amount).sum();
        stats
    }

    #[test]
    fn reload_between_moves_keeps_later_rollback_exact() {
        let mut session = ready_session(vec![card(1, Stage::New, 100), card(2, Stage::New, 1000)]);
        let first = session
            .begin_move(OpportunityId(1), Stage::New, Stage::Contacted)
            .unwrap()
            .unwrap();
        let second = session
            .begin_move(OpportunityId(2), Stage::New, Stage::Won)
            .unwrap()
            .unwrap();
        session.resolve(first, Outcome::Confirmed);

        let reload = session.begin_stats_reload();
        let server = server_stats(&[card(1, Stage::Contacted, 100), card(2, Stage::New, 1000)]);
        assert!(session.finish_stats_reload(reload, Ok(server)));
        assert_eq!(session.stats(), Some(&Stats::derive_from(session.store())));

        session.resolve(second, Outcome::Failed("500".into()));
        let stats = session.stats().unwrap();
        assert_eq!(stats, &Stats::derive_from(session.store()));
        assert_eq!(stats.count(Stage::New), 1);
        assert_eq!(stats.count(Stage::Contacted), 1);
        assert_eq!(stats.total_value, Amount::from_units(1100));
    }

    #[test]
    fn reload_keeps_closed_stages_out_of_pipeline_value() {
        let mut session = ready_session(vec![card(1, Stage::New, 1000), card(2, Stage::Lost, 40)]);
        let ticket = session
            .begin_move(OpportunityId(1), Stage::New, Stage::Won)
            .unwrap()
            .unwrap();
        session.resolve(ticket, Outcome::Confirmed);

        let reload = session.begin_stats_reload();
        let server = server_stats(&[card(1, Stage::Won, 1000), card(2, Stage::Lost, 40)]);
        assert_eq!(server.total_value, Amount::from_units(1040));
        assert!(session.finish_stats_reload(reload, Ok(server)));
        assert_eq!(session.stats().unwrap().total_value, Amount::ZERO);
    }

    #[test]
    fn reload_with_pending_delete_counts_the_card_until_confirmed() {
        let mut session = ready_session(vec![card(1, Stage::New, 30), card(2, Stage::Proposal, 70)]);
        let ticket = session.begin_delete(OpportunityId(1), Stage::New).unwrap();

        let reload = session.begin_stats_reload();
        let server = server_stats(&[card(1, Stage::New, 30), card(2, Stage::Proposal, 70)]);
        assert!(session.finish_stats_reload(reload, Ok(server)));
        assert_eq!(session.stats().unwrap().total_value, Amount::from_units(100));

        session.resolve(ticket, Outcome::Confirmed);
        assert_eq!(session.stats(), Some(&Stats::derive_from(session.store())));
    }

    #[test]
    fn stats_landing_before_pipeline_take_value_from_loaded_board() {
        let mut session = BoardSession::new();
        let load = session.begin_load();
        let reload = session.begin_stats_reload();
        let cards = [card(1, Stage::New, 25), card(2, Stage::Won, 500)];
        assert!(session.finish_stats_reload(reload, Ok(server_stats(&cards))));
        session.finish_load(load, Ok(cards.iter().cloned().collect()));
        assert_eq!(session.stats().unwrap().total_value, Amount::from_units(25));
    }
}
