//! Error types for board operations

use crate::entities::OpportunityId;
use crate::enums::Stage;
use thiserror::Error;

/// Errors raised by the store and the move controller.
///
/// None of these leave the board partially mutated: an operation that
/// returns an error has not changed any state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BoardError {
    /// The caller's view of an opportunity's stage disagrees with the store.
    #[error("Opportunity {id} is not in {expected} (store has it in {})", stage_or_none(.actual))]
    StaleMembership {
        id: OpportunityId,
        expected: Stage,
        actual: Option<Stage>,
    },

    #[error("Opportunity {id} not found")]
    NotFound { id: OpportunityId },

    /// Another intent on the same opportunity has not resolved yet.
    #[error("Opportunity {id} has a pending change")]
    Busy { id: OpportunityId },

    #[error("Source and target stage are the same")]
    SameStage,

    #[error("Board session is closed")]
    SessionClosed,
}

impl BoardError {
    /// Whether recovering from this error requires a full reload.
    pub fn requires_reload(&self) -> bool {
        matches!(self, BoardError::StaleMembership { .. } | BoardError::NotFound { .. })
    }
}

fn stage_or_none(stage: &Option<Stage>) -> &'static str {
    stage.map(|s| s.as_code()).unwrap_or("no stage")
}

pub type BoardResult<T> = Result<T, BoardError>;
