//! Opportunity records and the pipeline payload.

use crate::amount::Amount;
use crate::enums::{Priority, Stage};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Backend identifier of a sales opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpportunityId(pub i64);

impl OpportunityId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for OpportunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for OpportunityId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

/// Embedded customer summary sent alongside pipeline cards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

/// A sales deal as the board sees it.
///
/// Only `id`, `stage` and `amount` are structurally significant; the rest is
/// carried through untouched for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: OpportunityId,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "status", default = "default_stage")]
    pub stage: Stage,
    #[serde(default)]
    pub amount: Amount,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    /// Customer primary key, when the list endpoint sends it.
    #[serde(rename = "customer", default, deserialize_with = "lenient_i64")]
    pub customer_ref: Option<i64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub expected_close_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<Timestamp>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<Timestamp>,
}

fn default_stage() -> Stage {
    Stage::New
}

impl Opportunity {
    /// Minimal record, mostly useful for fixtures.
    pub fn new(id: impl Into<OpportunityId>, title: impl Into<String>, stage: Stage) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            stage,
            amount: Amount::ZERO,
            priority: Priority::default(),
            description: None,
            customer_ref: None,
            customer_name: None,
            customer_details: None,
            expected_close_date: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.amount = amount;
        self
    }

    pub fn with_customer(mut self, name: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_updated_at(mut self, updated_at: Timestamp) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Customer display name, preferring the flat field over embedded details.
    pub fn customer_display(&self) -> Option<&str> {
        self.customer_name
            .as_deref()
            .or_else(|| self.customer_details.as_ref().and_then(|d| d.name.as_deref()))
    }

    /// Last-update time used for the default board ordering.
    pub fn last_touched(&self) -> Option<Timestamp> {
        self.updated_at.or(self.created_at)
    }

    /// Case-insensitive substring match over title, customer and description.
    ///
    /// `needle` must already be lowercased.
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        let hit = |field: Option<&str>| {
            field
                .map(|value| value.to_lowercase().contains(needle))
                .unwrap_or(false)
        };
        hit(Some(self.title.as_str()))
            || hit(self.customer_display())
            || hit(self.description.as_deref())
    }
}

// ============================================================================
// PIPELINE PAYLOAD
// ============================================================================

/// Stage-partitioned opportunities as returned by `GET /pipeline`.
///
/// Always holds all six stages. Missing keys and non-array values become
/// empty lists; unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelinePayload {
    stages: BTreeMap<Stage, Vec<Opportunity>>,
}

impl PipelinePayload {
    pub fn empty() -> Self {
        Self {
            stages: Stage::ALL.iter().map(|s| (*s, Vec::new())).collect(),
        }
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let mut payload = Self::empty();
        let serde_json::Value::Object(mut map) = value else {
            return Ok(payload);
        };
        for stage in Stage::ALL {
            match map.remove(stage.as_code()) {
                Some(serde_json::Value::Array(items)) => {
                    let mut cards = Vec::with_capacity(items.len());
                    for item in items {
                        let mut card: Opportunity = serde_json::from_value(item)?;
                        card.stage = stage;
                        cards.push(card);
                    }
                    payload.stages.insert(stage, cards);
                }
                Some(other) => {
                    tracing::warn!(stage = %stage, kind = value_kind(&other), "Pipeline stage is not a list, using empty list");
                }
                None => {}
            }
        }
        Ok(payload)
    }

    pub fn stage(&self, stage: Stage) -> &[Opportunity] {
        self.stages.get(&stage).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replace one stage's list; cards are retagged with `stage`.
    pub fn set_stage(&mut self, stage: Stage, mut cards: Vec<Opportunity>) {
        for card in &mut cards {
            card.stage = stage;
        }
        self.stages.insert(stage, cards);
    }

    pub fn len(&self) -> usize {
        self.stages.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_stages(self) -> impl Iterator<Item = (Stage, Vec<Opportunity>)> {
        self.stages.into_iter()
    }
}

impl Default for PipelinePayload {
    fn default() -> Self {
        Self::empty()
    }
}

impl FromIterator<Opportunity> for PipelinePayload {
    /// Partition loose records by their own stage tag.
    fn from_iter<I: IntoIterator<Item = Opportunity>>(iter: I) -> Self {
        let mut payload = Self::empty();
        for card in iter {
            payload.stages.entry(card.stage).or_default().push(card);
        }
        payload
    }
}

impl<'de> Deserialize<'de> for PipelinePayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        PipelinePayload::from_value(value).map_err(serde::de::Error::custom)
    }
}

fn value_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

// ============================================================================
// LENIENT FIELD READERS
// ============================================================================

/// Parse RFC 3339 or the `DD/MM/YYYY HH:MM` detail-serializer format.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%d/%m/%Y %H:%M")
        .ok()
        .map(|naive| naive.and_utc())
}

fn lenient_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Timestamp>, D::Error> {
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => parse_timestamp(&s),
        _ => None,
    })
}

fn lenient_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok(),
        _ => None,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}
