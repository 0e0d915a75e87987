//! Enum types for pipeline entities

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// STAGE
// ============================================================================

/// Pipeline stage of a sales opportunity.
///
/// The declaration order is the board's column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    New,
    Contacted,
    Proposal,
    Negotiation,
    Won,
    Lost,
}

impl Stage {
    /// All stages in column order.
    pub const ALL: [Stage; 6] = [
        Stage::New,
        Stage::Contacted,
        Stage::Proposal,
        Stage::Negotiation,
        Stage::Won,
        Stage::Lost,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Wire code, as used in `status` fields and pipeline keys.
    pub fn as_code(&self) -> &'static str {
        match self {
            Stage::New => "NEW",
            Stage::Contacted => "CONTACTED",
            Stage::Proposal => "PROPOSAL",
            Stage::Negotiation => "NEGOTIATION",
            Stage::Won => "WON",
            Stage::Lost => "LOST",
        }
    }

    /// Human-facing column label.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::New => "New",
            Stage::Contacted => "Contacted",
            Stage::Proposal => "Proposal Sent",
            Stage::Negotiation => "Negotiation",
            Stage::Won => "Won",
            Stage::Lost => "Lost",
        }
    }

    /// Column position of this stage.
    pub fn index(&self) -> usize {
        match self {
            Stage::New => 0,
            Stage::Contacted => 1,
            Stage::Proposal => 2,
            Stage::Negotiation => 3,
            Stage::Won => 4,
            Stage::Lost => 5,
        }
    }

    pub fn from_index(index: usize) -> Option<Stage> {
        Self::ALL.get(index).copied()
    }

    /// WON and LOST are closed; their amounts are excluded from pipeline value.
    pub fn is_closed(&self) -> bool {
        matches!(self, Stage::Won | Stage::Lost)
    }

    pub fn is_open(&self) -> bool {
        !self.is_closed()
    }

    pub fn next(&self) -> Option<Stage> {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(&self) -> Option<Stage> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_code())
    }
}

impl FromStr for Stage {
    type Err = StageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NEW" => Ok(Stage::New),
            "CONTACTED" => Ok(Stage::Contacted),
            "PROPOSAL" => Ok(Stage::Proposal),
            "NEGOTIATION" => Ok(Stage::Negotiation),
            "WON" => Ok(Stage::Won),
            "LOST" => Ok(Stage::Lost),
            _ => Err(StageParseError(s.to_string())),
        }
    }
}

/// Error when parsing an invalid stage code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid stage: {0}")]
pub struct StageParseError(pub String);

// ============================================================================
// PRIORITY
// ============================================================================

/// Display priority of an opportunity. Unknown wire values read as `Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        let priority = match raw.as_deref().map(|s| s.trim().to_ascii_uppercase()) {
            Some(code) if code == "LOW" => Priority::Low,
            Some(code) if code == "HIGH" => Priority::High,
            _ => Priority::Medium,
        };
        Ok(priority)
    }
}
