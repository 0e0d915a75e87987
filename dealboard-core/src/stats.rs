//! Stats aggregator: counters fetched from the backend and kept in step
//! with the board by local arithmetic.

use crate::amount::Amount;
use crate::enums::Stage;
use crate::store::OpportunityStore;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Aggregate view over the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total_count: u64,
    /// Pipeline value: amounts of opportunities in open stages.
    pub total_value: Amount,
    #[serde(rename = "status_counts")]
    pub count_by_stage: BTreeMap<Stage, u64>,
}

impl Stats {
    pub fn empty() -> Self {
        Self {
            total_count: 0,
            total_value: Amount::ZERO,
            count_by_stage: Stage::ALL.iter().map(|s| (*s, 0)).collect(),
        }
    }

    /// Steady-state stats for the given store contents.
    pub fn derive_from(store: &OpportunityStore) -> Self {
        let mut stats = Self::empty();
        for (stage, cards) in store.lanes() {
            stats.count_by_stage.insert(stage, cards.len() as u64);
            stats.total_count += cards.len() as u64;
            if stage.is_open() {
                stats.total_value = stats.total_value + cards.iter().map(|c| c.amount).sum::<Amount>();
            }
        }
        stats
    }

    pub fn count(&self, stage: Stage) -> u64 {
        self.count_by_stage.get(&stage).copied().unwrap_or(0)
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::empty()
    }
}

/// Wire shape of `GET /sales/stats`. Extra keys (task counts, events) are ignored.
///
/// The backend's `total_value` sums every stage; the session replaces it with
/// the board's open-stage value once the fetch is applied.
#[derive(Debug, Deserialize)]
struct StatsWire {
    #[serde(default)]
    total_count: Option<serde_json::Value>,
    #[serde(default)]
    total_value: Amount,
    #[serde(default)]
    status_counts: Option<BTreeMap<String, serde_json::Value>>,
}

impl<'de> Deserialize<'de> for Stats {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = StatsWire::deserialize(deserializer)?;
        let mut stats = Stats::empty();
        stats.total_count = wire.total_count.as_ref().map(count_value).unwrap_or(0);
        stats.total_value = wire.total_value;
        for (code, value) in wire.status_counts.unwrap_or_default() {
            match code.parse::<Stage>() {
                Ok(stage) => {
                    stats.count_by_stage.insert(stage, count_value(&value));
                }
                Err(_) => tracing::debug!(code = %code, "Ignoring unknown stage in stats"),
            }
        }
        Ok(stats)
    }
}

fn count_value(value: &serde_json::Value) -> u64 {
    match value {
        serde_json::Value::Number(n) => n.as_u64().unwrap_or(0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

// ============================================================================
// DELTAS
// ============================================================================

/// Exact record of what an adjustment changed, so it can be inverted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsDelta {
    pub count_changes: Vec<(Stage, i64)>,
    pub total_count_change: i64,
    pub value_change_cents: i64,
}

impl StatsDelta {
    pub fn is_empty(&self) -> bool {
        self.count_changes.iter().all(|(_, c)| *c == 0)
            && self.total_count_change == 0
            && self.value_change_cents == 0
    }
}

// ============================================================================
// AGGREGATOR
// ============================================================================

/// Ticket for an in-flight stats fetch. Only the newest ticket may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadTicket(u64);

#[derive(Debug, Clone, Default)]
pub struct StatsAggregator {
    /// `None` until the first fetch lands; adjustments before that are no-ops.
    stats: Option<Stats>,
    revision: u64,
    reload_seq: u64,
}

impl StatsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stats(stats: Stats) -> Self {
        Self {
            stats: Some(stats),
            ..Self::default()
        }
    }

    pub fn current(&self) -> Option<&Stats> {
        self.stats.as_ref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Optimistic counter update for a stage move.
    pub fn adjust_for_move(&mut self, from: Stage, to: Stage, amount: Amount) -> StatsDelta {
        let Some(stats) = self.stats.as_mut() else {
            return StatsDelta::default();
        };
        if from == to {
            return StatsDelta::default();
        }

        let mut delta = StatsDelta::default();
        delta.count_changes.push((from, bump(stats, from, -1)));
        delta.count_changes.push((to, bump(stats, to, 1)));

        let value_change = match (from.is_open(), to.is_open()) {
            (true, false) => -amount.cents(),
            (false, true) => amount.cents(),
            _ => 0,
        };
        delta.value_change_cents = shift_value(stats, value_change);
        self.revision += 1;
        delta
    }

    /// Counter update for a confirmed deletion.
    pub fn adjust_for_delete(&mut self, stage: Stage, amount: Amount) -> StatsDelta {
        let Some(stats) = self.stats.as_mut() else {
            return StatsDelta::default();
        };
        let mut delta = StatsDelta::default();
        delta.count_changes.push((stage, bump(stats, stage, -1)));
        let before = stats.total_count;
        stats.total_count = stats.total_count.saturating_sub(1);
        delta.total_count_change = stats.total_count as i64 - before as i64;
        if stage.is_open() {
            delta.value_change_cents = shift_value(stats, -amount.cents());
        }
        self.revision += 1;
        delta
    }

    /// Undo a delta previously returned by this aggregator.
    pub fn revert(&mut self, delta: &StatsDelta) {
        let Some(stats) = self.stats.as_mut() else {
            return;
        };
        for (stage, change) in delta.count_changes.iter().rev() {
            bump(stats, *stage, -change);
        }
        stats.total_count = apply_signed(stats.total_count, -delta.total_count_change);
        shift_value(stats, -delta.value_change_cents);
        self.revision += 1;
    }

    /// Overwrite the counters with a saved copy.
    pub(crate) fn restore(&mut self, stats: Option<Stats>) {
        self.stats = stats;
        self.revision += 1;
    }

    /// Start a full reload; the returned ticket must accompany the result.
    pub fn begin_reload(&mut self) -> ReloadTicket {
        self.reload_seq += 1;
        ReloadTicket(self.reload_seq)
    }

    /// Apply a fetched snapshot. Returns `false` (and changes nothing) when a
    /// newer reload has been started since `ticket` was issued.
    pub fn finish_reload(&mut self, ticket: ReloadTicket, stats: Stats) -> bool {
        if ticket.0 != self.reload_seq {
            tracing::debug!(ticket = ticket.0, latest = self.reload_seq, "Dropping superseded stats reload");
            return false;
        }
        self.stats = Some(stats);
        self.revision += 1;
        true
    }

    /// Replace the pipeline value, keeping the counts.
    pub(crate) fn set_pipeline_value(&mut self, value: Amount) {
        let Some(stats) = self.stats.as_mut() else {
            return;
        };
        if stats.total_value != value {
            stats.total_value = value;
            self.revision += 1;
        }
    }
}

/// Change one stage count by `by`, stopping at zero. Returns the applied change.
fn bump(stats: &mut Stats, stage: Stage, by: i64) -> i64 {
    let slot = stats.count_by_stage.entry(stage).or_insert(0);
    let before = *slot;
    *slot = apply_signed(before, by);
    *slot as i64 - before as i64
}

fn apply_signed(value: u64, by: i64) -> u64 {
    if by >= 0 {
        value.saturating_add(by as u64)
    } else {
        value.saturating_sub(by.unsigned_abs())
    }
}

/// Shift `total_value` by `cents`, stopping at zero. Returns the applied change.
fn shift_value(stats: &mut Stats, cents: i64) -> i64 {
    let before = stats.total_value;
    stats.total_value = if cents >= 0 {
        before.saturating_add(Amount::from_cents(cents))
    } else {
        before.saturating_sub_floor(Amount::from_cents(-cents))
    };
    stats.total_value.cents() - before.cents()
}
