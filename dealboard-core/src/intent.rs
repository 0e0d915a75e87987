//! Move and delete intents with their rollback snapshots.
//!
//! An intent is created when a local mutation is applied ahead of the
//! backend and lives until the backend confirms or rejects it.
//!
//! ```text
//! PendingLocal -> Confirming -> Confirmed
//!                            -> Reverted
//! ```

use crate::entities::{Opportunity, OpportunityId};
use crate::enums::Stage;
use crate::stats::{Stats, StatsDelta};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntentId(pub(crate) u64);

impl fmt::Display for IntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "intent-{}", self.0)
    }
}

/// Board session generation. Resolutions from an older epoch are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Epoch(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentPhase {
    /// Snapshot taken, local mutation being applied.
    PendingLocal,
    /// Local mutation visible, waiting on the backend.
    Confirming,
    Confirmed,
    Reverted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentKind {
    Move { from: Stage, to: Stage },
    Delete { stage: Stage },
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntentKind::Move { from, to } => write!(f, "move {} -> {}", from, to),
            IntentKind::Delete { stage } => write!(f, "delete from {}", stage),
        }
    }
}

/// Everything the asynchronous side needs to run the remote call and
/// report back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntentTicket {
    pub intent: IntentId,
    pub epoch: Epoch,
    pub opportunity_id: OpportunityId,
    pub kind: IntentKind,
}

/// State captured before a move is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveSnapshot {
    pub record: Opportunity,
    pub from_index: usize,
    pub from_lane: Vec<Opportunity>,
    pub to_lane: Vec<Opportunity>,
    pub stats_before: Option<Stats>,
    pub stats_delta: StatsDelta,
    /// Lane revisions right after the optimistic apply.
    pub(crate) lane_revisions: (u64, u64),
    pub(crate) stats_revision: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveIntent {
    pub id: IntentId,
    pub opportunity_id: OpportunityId,
    pub from_stage: Stage,
    pub to_stage: Stage,
    pub phase: IntentPhase,
    pub snapshot_before: MoveSnapshot,
}

/// State captured before an optimistic delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteSnapshot {
    pub record: Opportunity,
    pub index: usize,
    pub lane: Vec<Opportunity>,
    pub(crate) lane_revision: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteIntent {
    pub id: IntentId,
    pub opportunity_id: OpportunityId,
    pub stage: Stage,
    pub phase: IntentPhase,
    pub snapshot_before: DeleteSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingIntent {
    Move(MoveIntent),
    Delete(DeleteIntent),
}

impl PendingIntent {
    pub fn id(&self) -> IntentId {
        match self {
            PendingIntent::Move(intent) => intent.id,
            PendingIntent::Delete(intent) => intent.id,
        }
    }

    pub fn phase(&self) -> IntentPhase {
        match self {
            PendingIntent::Move(intent) => intent.phase,
            PendingIntent::Delete(intent) => intent.phase,
        }
    }
}

/// Result reported by the backend for an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Confirmed,
    Failed(String),
}

/// Why a resolution was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// The board was torn down.
    Closed,
    /// A full load replaced the board after the intent started.
    Superseded,
    /// No matching intent is in flight.
    Unknown,
}

/// What applying an outcome did to the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Confirmed {
        opportunity_id: OpportunityId,
        kind: IntentKind,
        /// Whether the caller should re-fetch stats now.
        reload_stats: bool,
    },
    Reverted {
        opportunity_id: OpportunityId,
        kind: IntentKind,
        reason: String,
    },
    Discarded {
        opportunity_id: OpportunityId,
        reason: DiscardReason,
    },
}

impl Resolution {
    /// Terminal phase reached, if the resolution was applied.
    pub fn phase(&self) -> Option<IntentPhase> {
        match self {
            Resolution::Confirmed { .. } => Some(IntentPhase::Confirmed),
            Resolution::Reverted { .. } => Some(IntentPhase::Reverted),
            Resolution::Discarded { .. } => None,
        }
    }
}
