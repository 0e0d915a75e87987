//! Opportunity store: the authoritative opportunity -> stage membership.
//!
//! Every opportunity lives in exactly one stage lane. Mutations either keep
//! that partition intact or are rejected without touching anything.

use crate::entities::{Opportunity, OpportunityId, PipelinePayload};
use crate::enums::Stage;
use crate::error::{BoardError, BoardResult};
use std::collections::{HashMap, HashSet};

/// Outcome of a full load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    /// Ids that appeared in more than one lane; only the first was kept.
    pub dropped_duplicates: Vec<OpportunityId>,
}

#[derive(Debug, Clone, Default)]
pub struct OpportunityStore {
    lanes: [Vec<Opportunity>; Stage::COUNT],
    index: HashMap<OpportunityId, Stage>,
    /// Bumped on every change to a lane; used to detect interleaved writes.
    revisions: [u64; Stage::COUNT],
}

impl OpportunityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_payload(payload: PipelinePayload) -> Self {
        let mut store = Self::new();
        store.load(payload);
        store
    }

    /// Replace the whole store. No merge with previous contents.
    pub fn load(&mut self, payload: PipelinePayload) -> LoadReport {
        let mut lanes: [Vec<Opportunity>; Stage::COUNT] = Default::default();
        let mut index = HashMap::new();
        let mut report = LoadReport::default();

        for (stage, cards) in payload.into_stages() {
            for mut card in cards {
                if index.contains_key(&card.id) {
                    tracing::warn!(id = %card.id, stage = %stage, "Duplicate opportunity in pipeline payload, keeping first");
                    report.dropped_duplicates.push(card.id);
                    continue;
                }
                card.stage = stage;
                index.insert(card.id, stage);
                lanes[stage.index()].push(card);
                report.loaded += 1;
            }
        }

        self.lanes = lanes;
        self.index = index;
        for revision in &mut self.revisions {
            *revision += 1;
        }
        report
    }

    pub fn lane(&self, stage: Stage) -> &[Opportunity] {
        &self.lanes[stage.index()]
    }

    pub fn lanes(&self) -> impl Iterator<Item = (Stage, &[Opportunity])> {
        Stage::ALL.into_iter().map(move |s| (s, self.lane(s)))
    }

    pub fn stage_of(&self, id: OpportunityId) -> Option<Stage> {
        self.index.get(&id).copied()
    }

    pub fn get(&self, id: OpportunityId) -> Option<&Opportunity> {
        let stage = self.stage_of(id)?;
        self.lane(stage).iter().find(|card| card.id == id)
    }

    pub fn contains(&self, id: OpportunityId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = OpportunityId> + '_ {
        self.lanes.iter().flatten().map(|card| card.id)
    }

    pub fn revision(&self, stage: Stage) -> u64 {
        self.revisions[stage.index()]
    }

    /// Move `id` from `from` to the end of `to`, retagging its stage.
    ///
    /// Returns the index the card held in `from`. Fails without mutating if
    /// the card is not currently in `from`.
    pub fn move_stage(&mut self, id: OpportunityId, from: Stage, to: Stage) -> BoardResult<usize> {
        if from == to {
            return Err(BoardError::SameStage);
        }
        let position = self.position_in(id, from)?;
        let mut card = self.lanes[from.index()].remove(position);
        card.stage = to;
        self.lanes[to.index()].push(card);
        self.index.insert(id, to);
        self.touch(from);
        self.touch(to);
        Ok(position)
    }

    /// Delete `id` from `stage`. Returns the removed card and its former index.
    pub fn remove(&mut self, id: OpportunityId, stage: Stage) -> Option<(usize, Opportunity)> {
        let position = self.position_in(id, stage).ok()?;
        let card = self.lanes[stage.index()].remove(position);
        self.index.remove(&id);
        self.touch(stage);
        Some((position, card))
    }

    /// Put a previously removed card back at `index` (clamped to the lane length).
    pub fn restore(&mut self, stage: Stage, index: usize, mut card: Opportunity) -> BoardResult<()> {
        if let Some(actual) = self.stage_of(card.id) {
            return Err(BoardError::StaleMembership {
                id: card.id,
                expected: stage,
                actual: Some(actual),
            });
        }
        card.stage = stage;
        self.index.insert(card.id, stage);
        let lane = &mut self.lanes[stage.index()];
        let index = index.min(lane.len());
        lane.insert(index, card);
        self.touch(stage);
        Ok(())
    }

    /// Swap in a saved copy of a lane verbatim.
    ///
    /// The caller guarantees `cards` holds exactly the ids currently indexed
    /// to `stage` plus any it is taking back from elsewhere.
    pub(crate) fn replace_lane(&mut self, stage: Stage, cards: Vec<Opportunity>) {
        let old = std::mem::replace(&mut self.lanes[stage.index()], cards);
        for card in &old {
            if self.index.get(&card.id) == Some(&stage) {
                self.index.remove(&card.id);
            }
        }
        for card in &self.lanes[stage.index()] {
            self.index.insert(card.id, stage);
        }
        self.touch(stage);
    }

    /// Ids that appear more than once across lanes. Empty when the partition holds.
    pub fn partition_violations(&self) -> Vec<OpportunityId> {
        let mut seen = HashSet::new();
        let mut dupes = Vec::new();
        for card in self.lanes.iter().flatten() {
            if !seen.insert(card.id) {
                dupes.push(card.id);
            }
        }
        dupes
    }

    fn position_in(&self, id: OpportunityId, stage: Stage) -> BoardResult<usize> {
        match self.stage_of(id) {
            None => Err(BoardError::NotFound { id }),
            Some(actual) if actual != stage => Err(BoardError::StaleMembership {
                id,
                expected: stage,
                actual: Some(actual),
            }),
            Some(_) => self.lanes[stage.index()]
                .iter()
                .position(|card| card.id == id)
                .ok_or(BoardError::NotFound { id }),
        }
    }

    fn touch(&mut self, stage: Stage) {
        self.revisions[stage.index()] += 1;
    }
}

/// Two stores are equal when they hold the same lanes in the same order.
impl PartialEq for OpportunityStore {
    fn eq(&self, other: &Self) -> bool {
        self.lanes == other.lanes
    }
}

impl Eq for OpportunityStore {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;

    fn card(id: i64, stage: Stage) -> Opportunity {
        Opportunity::new(id, format!("deal {id}"), stage).with_amount(Amount::from_units(id * 100))
    }

    fn seeded() -> OpportunityStore {
        OpportunityStore::from_payload(
            [
                card(1, Stage::New),
                card(2, Stage::New),
                card(3, Stage::Proposal),
                card(4, Stage::Won),
            ]
            .into_iter()
            .collect(),
        )
    }

    #[test]
    fn load_replaces_everything() {
        let mut store = seeded();
        let report = store.load([card(9, Stage::Lost)].into_iter().collect());
        assert_eq!(report.loaded, 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.stage_of(OpportunityId(9)), Some(Stage::Lost));
        assert!(!store.contains(OpportunityId(1)));
    }

    #[test]
    fn load_drops_duplicate_ids_after_first_stage() {
        let mut payload = PipelinePayload::empty();
        payload.set_stage(Stage::New, vec![card(1, Stage::New)]);
        payload.set_stage(Stage::Won, vec![card(1, Stage::Won), card(2, Stage::Won)]);
        let mut store = OpportunityStore::new();
        let report = store.load(payload);
        assert_eq!(report.loaded, 2);
        assert_eq!(report.dropped_duplicates, vec![OpportunityId(1)]);
        assert_eq!(store.stage_of(OpportunityId(1)), Some(Stage::New));
        assert!(store.partition_violations().is_empty());
    }

    #[test]
    fn move_appends_to_target_and_keeps_fields() {
        let mut store = seeded();
        let before = store.get(OpportunityId(1)).cloned().unwrap();
        let index = store.move_stage(OpportunityId(1), Stage::New, Stage::Proposal).unwrap();
        assert_eq!(index, 0);
        let lane = store.lane(Stage::Proposal);
        assert_eq!(lane.last().map(|c| c.id), Some(OpportunityId(1)));
        let after = lane.last().unwrap();
        assert_eq!(after.stage, Stage::Proposal);
        assert_eq!(after.amount, before.amount);
        assert_eq!(after.title, before.title);
        assert_eq!(store.lane(Stage::New).len(), 1);
    }

    #[test]
    fn stale_move_is_rejected_without_change() {
        let mut store = seeded();
        let before = store.clone();
        let err = store
            .move_stage(OpportunityId(3), Stage::New, Stage::Won)
            .unwrap_err();
        assert_eq!(
            err,
            BoardError::StaleMembership {
                id: OpportunityId(3),
                expected: Stage::New,
                actual: Some(Stage::Proposal),
            }
        );
        assert_eq!(store, before);
        assert_eq!(
            store.move_stage(OpportunityId(99), Stage::New, Stage::Won),
            Err(BoardError::NotFound { id: OpportunityId(99) })
        );
    }

    #[test]
    fn remove_is_noop_when_absent() {
        let mut store = seeded();
        assert!(store.remove(OpportunityId(1), Stage::Won).is_none());
        let (index, removed) = store.remove(OpportunityId(2), Stage::New).unwrap();
        assert_eq!(index, 1);
        assert_eq!(removed.id, OpportunityId(2));
        assert!(!store.contains(OpportunityId(2)));
    }

    #[test]
    fn restore_puts_card_back_in_place() {
        let mut store = seeded();
        let before = store.clone();
        let (index, removed) = store.remove(OpportunityId(1), Stage::New).unwrap();
        store.restore(Stage::New, index, removed).unwrap();
        assert_eq!(store, before);
    }

    #[test]
    fn restore_refuses_an_id_that_is_still_present() {
        let mut store = seeded();
        let dup = card(1, Stage::New);
        assert!(store.restore(Stage::Won, 0, dup).is_err());
        assert!(store.partition_violations().is_empty());
    }

    #[test]
    fn partition_violations_name_each_repeated_id() {
        let mut store = seeded();
        store.replace_lane(Stage::Lost, vec![card(1, Stage::Lost), card(2, Stage::Lost)]);
        assert_eq!(
            store.partition_violations(),
            vec![OpportunityId(1), OpportunityId(2)]
        );
    }

    #[test]
    fn revisions_track_touched_lanes_only() {
        let mut store = seeded();
        let won = store.revision(Stage::Won);
        let lost = store.revision(Stage::Lost);
        store.move_stage(OpportunityId(1), Stage::New, Stage::Won).unwrap();
        assert_eq!(store.revision(Stage::Won), won + 1);
        assert_eq!(store.revision(Stage::Lost), lost);
    }
}
