//! Reusable widget components.

pub mod detail;
pub mod filter;
pub mod stats;
pub mod status;

pub use detail::{opportunity_fields, DetailPanel};
pub use filter::{FilterBar, FilterOption};
pub use stats::StatsBar;
pub use status::StatusIndicator;
