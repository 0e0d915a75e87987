//! Pipeline projector: pure per-stage views over the store.

use crate::amount::Amount;
use crate::entities::Opportunity;
use crate::enums::Stage;
use crate::query::{Ordering, SortDirection, SortKey};
use crate::store::OpportunityStore;
use std::cmp::Ordering as CmpOrdering;

/// How cards are ordered within a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionOrder {
    /// Most recently updated first (falling back to created time, then id).
    #[default]
    LastUpdated,
    By(Ordering),
    /// The store's own lane order.
    StoreOrder,
}

/// One board column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedColumn<'a> {
    pub stage: Stage,
    pub cards: Vec<&'a Opportunity>,
    pub total: Amount,
}

impl ProjectedColumn<'_> {
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// All six columns, filtered by `filter_text` and sorted by `order`.
pub fn projected_stages<'a>(
    store: &'a OpportunityStore,
    filter_text: &str,
    order: ProjectionOrder,
) -> Vec<ProjectedColumn<'a>> {
    let needle = filter_text.trim().to_lowercase();
    store
        .lanes()
        .map(|(stage, lane)| {
            let mut cards: Vec<&Opportunity> = lane
                .iter()
                .filter(|card| card.matches_lowercase(&needle))
                .collect();
            sort_cards(&mut cards, order);
            let total = cards.iter().map(|card| card.amount).sum::<Amount>();
            ProjectedColumn { stage, cards, total }
        })
        .collect()
}

/// Stable sort of a card slice.
pub fn sort_cards(cards: &mut [&Opportunity], order: ProjectionOrder) {
    match order {
        ProjectionOrder::StoreOrder => {}
        ProjectionOrder::LastUpdated => cards.sort_by(|a, b| last_updated_desc(a, b)),
        ProjectionOrder::By(ordering) => cards.sort_by(|a, b| {
            let cmp = compare_by(a, b, ordering.key);
            match ordering.direction {
                SortDirection::Ascending => cmp,
                SortDirection::Descending => cmp.reverse(),
            }
        }),
    }
}

fn last_updated_desc(a: &Opportunity, b: &Opportunity) -> CmpOrdering {
    b.last_touched()
        .cmp(&a.last_touched())
        .then_with(|| b.id.cmp(&a.id))
}

fn compare_by(a: &Opportunity, b: &Opportunity, key: SortKey) -> CmpOrdering {
    match key {
        SortKey::UpdatedAt => a.last_touched().cmp(&b.last_touched()),
        SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        SortKey::Amount => a.amount.cmp(&b.amount),
        SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortKey::ExpectedCloseDate => a.expected_close_date.cmp(&b.expected_close_date),
    }
}
