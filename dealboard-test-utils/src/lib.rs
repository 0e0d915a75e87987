//! Dealboard Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - Proptest generators for pipeline data
//! - Fixtures for common board scenarios
//! - Assertions for board invariants

pub use dealboard_core::{
    Amount, BoardSession, IntentTicket, Opportunity, OpportunityId, OpportunityStore,
    PipelinePayload, Priority, Stage, Stats, Timestamp,
};

use chrono::{TimeZone, Utc};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for pipeline types.

    use super::*;
    use proptest::prelude::*;

    pub fn arb_stage() -> impl Strategy<Value = Stage> {
        (0..Stage::COUNT).prop_map(|i| Stage::ALL[i])
    }

    pub fn arb_open_stage() -> impl Strategy<Value = Stage> {
        prop_oneof![
            Just(Stage::New),
            Just(Stage::Contacted),
            Just(Stage::Proposal),
            Just(Stage::Negotiation),
        ]
    }

    pub fn arb_priority() -> impl Strategy<Value = Priority> {
        prop_oneof![Just(Priority::Low), Just(Priority::Medium), Just(Priority::High)]
    }

    /// Amounts up to ten million, in cents.
    pub fn arb_amount() -> impl Strategy<Value = Amount> {
        (0i64..1_000_000_000).prop_map(Amount::from_cents)
    }

    /// Timestamps across 2020-2030, second precision.
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        (1_577_836_800i64..1_893_456_000).prop_map(|secs| {
            Utc.timestamp_opt(secs, 0)
                .single()
                .unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap())
        })
    }

    /// An opportunity with the given id.
    pub fn arb_opportunity(id: i64) -> impl Strategy<Value = Opportunity> {
        (
            "[A-Za-z][A-Za-z0-9 ]{0,30}",
            arb_stage(),
            arb_amount(),
            arb_priority(),
            prop::option::of("[A-Za-z ]{1,20}"),
            prop::option::of(arb_timestamp()),
        )
            .prop_map(move |(title, stage, amount, priority, customer, updated_at)| {
                let mut card = Opportunity::new(id, title, stage).with_amount(amount);
                card.priority = priority;
                card.customer_name = customer;
                card.updated_at = updated_at;
                card
            })
    }

    /// A pipeline of up to `max` opportunities with ids `1..=n`.
    pub fn arb_pipeline(max: usize) -> impl Strategy<Value = PipelinePayload> {
        (0..=max).prop_flat_map(|n| {
            (1..=n as i64)
                .map(arb_opportunity)
                .collect::<Vec<_>>()
                .prop_map(|cards| cards.into_iter().collect::<PipelinePayload>())
        })
    }

    /// A sequence of `(card position, target stage)` picks for move scripts.
    pub fn arb_move_script(len: usize) -> impl Strategy<Value = Vec<(prop::sample::Index, Stage)>> {
        prop::collection::vec((any::<prop::sample::Index>(), arb_stage()), 0..=len)
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Ready-made records and boards.

    use super::*;

    pub fn opportunity(id: i64, stage: Stage, units: i64) -> Opportunity {
        Opportunity::new(id, format!("Deal {id}"), stage)
            .with_amount(Amount::from_units(units))
            .with_customer(format!("Customer {id}"))
    }

    /// Build a payload from `(id, stage, amount in whole units)` triples.
    pub fn pipeline(cards: &[(i64, Stage, i64)]) -> PipelinePayload {
        cards
            .iter()
            .map(|(id, stage, units)| opportunity(*id, *stage, *units))
            .collect()
    }

    /// The stats a backend would report for this payload. Like the real
    /// endpoint, `total_value` sums every stage, closed ones included.
    pub fn stats_for(payload: &PipelinePayload) -> Stats {
        let mut stats = Stats::derive_from(&OpportunityStore::from_payload(payload.clone()));
        stats.total_value = payload
            .clone()
            .into_stages()
            .flat_map(|(_, cards)| cards)
            .map(|card| card.amount)
            .sum();
        stats
    }

    /// A session with `payload` loaded and matching stats applied.
    pub fn ready_session(payload: PipelinePayload) -> BoardSession {
        let stats = stats_for(&payload);
        let mut session = BoardSession::new();
        let load = session.begin_load();
        session.finish_load(load, Ok(payload));
        let reload = session.begin_stats_reload();
        session.finish_stats_reload(reload, Ok(stats));
        session
    }

    /// `GET /pipeline` body in wire form.
    pub fn pipeline_json(payload: &PipelinePayload) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        for stage in Stage::ALL {
            let cards = payload
                .stage(stage)
                .iter()
                .map(|card| {
                    serde_json::json!({
                        "id": card.id.get(),
                        "title": card.title,
                        "status": stage.as_code(),
                        "amount": card.amount.to_string(),
                        "priority": "MEDIUM",
                        "customer_name": card.customer_name,
                    })
                })
                .collect();
            body.insert(stage.as_code().to_string(), serde_json::Value::Array(cards));
        }
        serde_json::Value::Object(body)
    }

    pub fn at(hour: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0)
            .single()
            .unwrap_or_default()
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Board invariant checks.

    use super::*;

    /// Every opportunity sits in exactly one lane, and its stage field agrees.
    pub fn assert_partition(store: &OpportunityStore) {
        let violations = store.partition_violations();
        assert!(violations.is_empty(), "partition violated for {:?}", violations);
        let mut seen = std::collections::HashSet::new();
        for (stage, lane) in store.lanes() {
            for card in lane {
                assert!(seen.insert(card.id), "{} appears twice", card.id);
                assert_eq!(card.stage, stage, "{} carries the wrong stage", card.id);
            }
        }
        assert_eq!(seen.len(), store.len());
    }

    /// With no intents in flight, counters match the board exactly.
    pub fn assert_stats_match_board(session: &BoardSession) {
        let Some(stats) = session.stats() else {
            panic!("stats not loaded");
        };
        assert_eq!(stats, &Stats::derive_from(session.store()));
    }

    pub fn assert_in_stage(store: &OpportunityStore, id: i64, stage: Stage) {
        assert_eq!(
            store.stage_of(OpportunityId(id)),
            Some(stage),
            "opportunity {id} expected in {stage}"
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================
