//! Search and listing parameters shared by the board and the list view.

use crate::entities::{Opportunity, PipelinePayload};
use crate::enums::Stage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Field an ordering applies to. Names match the backend's `ordering` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    UpdatedAt,
    CreatedAt,
    Amount,
    Title,
    ExpectedCloseDate,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::UpdatedAt,
        SortKey::CreatedAt,
        SortKey::Amount,
        SortKey::Title,
        SortKey::ExpectedCloseDate,
    ];

    pub fn field_name(&self) -> &'static str {
        match self {
            SortKey::UpdatedAt => "updated_at",
            SortKey::CreatedAt => "created_at",
            SortKey::Amount => "amount",
            SortKey::Title => "title",
            SortKey::ExpectedCloseDate => "expected_close_date",
        }
    }

    pub fn next(&self) -> SortKey {
        let idx = Self::ALL.iter().position(|k| k == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn flipped(&self) -> SortDirection {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// A field plus direction, e.g. `-updated_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ordering {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Ordering {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Backend `ordering` query value.
    pub fn to_param(&self) -> String {
        match self.direction {
            SortDirection::Ascending => self.key.field_name().to_string(),
            SortDirection::Descending => format!("-{}", self.key.field_name()),
        }
    }
}

impl Default for Ordering {
    fn default() -> Self {
        Self::new(SortKey::UpdatedAt, SortDirection::Descending)
    }
}

impl fmt::Display for Ordering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = match self.direction {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        };
        write!(f, "{} {}", self.key.field_name(), arrow)
    }
}

/// Free-text query with an optional stage restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    pub stage: Option<Stage>,
}

impl SearchQuery {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            stage: None,
        }
    }

    /// Trimmed search text, or `None` when blank.
    pub fn search_term(&self) -> Option<&str> {
        let trimmed = self.text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// Query string for `GET /pipeline`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl From<&SearchQuery> for PipelineParams {
    fn from(query: &SearchQuery) -> Self {
        Self {
            search: query.search_term().map(str::to_string),
        }
    }
}

/// Query string for `GET /sales`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Stage>,
    pub ordering: String,
    pub limit: u32,
    pub offset: u64,
}

/// Pagination window for the list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u32,
}

impl PageRequest {
    pub fn first(per_page: u32) -> Self {
        Self { page: 0, per_page }
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(u64::from(self.per_page))
    }
}

impl ListParams {
    pub fn new(query: &SearchQuery, ordering: Ordering, page: PageRequest) -> Self {
        Self {
            search: query.search_term().map(str::to_string),
            status: query.stage,
            ordering: ordering.to_param(),
            limit: page.per_page,
            offset: page.offset(),
        }
    }
}

/// One page of the flat list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub results: Vec<T>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            count: 0,
            results: Vec::new(),
        }
    }
}

impl<T> Page<T> {
    /// Number of pages at `per_page` items each (at least one).
    pub fn page_count(&self, per_page: u32) -> u64 {
        let per_page = u64::from(per_page.max(1));
        self.count.div_ceil(per_page).max(1)
    }
}

/// Which shape the caller wants back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewRequest {
    Board,
    List { ordering: Ordering, page: PageRequest },
}

/// Result of a gateway search; both variants carry the same record shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResult {
    Board(PipelinePayload),
    List(Page<Opportunity>),
}
