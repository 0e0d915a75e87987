//! Dealboard Core - Pipeline Board State
//!
//! Synchronous state behind the sales pipeline board: the opportunity store,
//! per-stage projections, aggregate stats and the optimistic move controller.
//! No I/O happens here; remote calls are run by the caller and their outcomes
//! are fed back into a [`BoardSession`].

pub mod amount;
pub mod entities;
pub mod enums;
pub mod error;
pub mod intent;
pub mod projector;
pub mod query;
pub mod session;
pub mod stats;
pub mod store;

pub use amount::Amount;
pub use entities::{parse_timestamp, CustomerDetails, Opportunity, OpportunityId, PipelinePayload, Timestamp};
pub use enums::{Priority, Stage, StageParseError};
pub use error::{BoardError, BoardResult};
pub use intent::{
    DeleteIntent, DeleteSnapshot, DiscardReason, Epoch, IntentId, IntentKind, IntentPhase,
    IntentTicket, MoveIntent, MoveSnapshot, Outcome, PendingIntent, Resolution,
};
pub use projector::{projected_stages, sort_cards, ProjectedColumn, ProjectionOrder};
pub use query::{
    ListParams, Ordering, Page, PageRequest, PipelineParams, SearchQuery, SearchResult,
    SortDirection, SortKey, ViewRequest,
};
pub use session::{BoardSession, BoardStatus, LoadOutcome, LoadTicket};
pub use stats::{ReloadTicket, Stats, StatsAggregator, StatsDelta};
pub use store::{LoadReport, OpportunityStore};
