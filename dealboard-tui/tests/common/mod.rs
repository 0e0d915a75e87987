//! Shared helpers for dealboard-tui integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use dealboard_core::{
    ListParams, Opportunity, OpportunityId, OpportunityStore, Page, PipelineParams,
    PipelinePayload, Stage, Stats,
};
use dealboard_tui::api_client::ApiClientError;
use dealboard_tui::config::{AuthConfig, ThemeConfig, TuiConfig};
use dealboard_tui::events::{BackendEvent, TuiEvent};
use dealboard_tui::traits::SalesBackend;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

pub fn base_config() -> TuiConfig {
    TuiConfig {
        api_base_url: "http://localhost:8000/api".to_string(),
        trailing_slash: true,
        auth: AuthConfig {
            api_key: Some("test-key".to_string()),
            jwt: None,
        },
        request_timeout_ms: 5_000,
        refresh_interval_ms: 2_000,
        page_size: 20,
        persistence_path: "tmp/dealboard.json".into(),
        log_path: "tmp/dealboard.log".into(),
        log_level: "info".to_string(),
        theme: ThemeConfig {
            name: "synthbrute".to_string(),
        },
    }
}

#[derive(Default)]
struct BackendState {
    sales: Vec<Opportunity>,
    fail_update: HashSet<OpportunityId>,
    fail_delete: HashSet<OpportunityId>,
    fail_pipeline: bool,
}

/// A sales backend holding its records in memory.
#[derive(Default)]
pub struct InMemoryBackend {
    state: Mutex<BackendState>,
}

impl InMemoryBackend {
    pub fn with_pipeline(payload: PipelinePayload) -> Self {
        let sales = payload.into_stages().flat_map(|(_, cards)| cards).collect();
        Self {
            state: Mutex::new(BackendState {
                sales,
                ..Default::default()
            }),
        }
    }

    pub fn fail_update(&self, id: i64) {
        self.state.lock().unwrap().fail_update.insert(OpportunityId(id));
    }

    pub fn fail_delete(&self, id: i64) {
        self.state.lock().unwrap().fail_delete.insert(OpportunityId(id));
    }

    pub fn set_fail_pipeline(&self, fail: bool) {
        self.state.lock().unwrap().fail_pipeline = fail;
    }

    /// Change a record behind the board's back.
    pub fn set_stage(&self, id: i64, stage: Stage) {
        let mut state = self.state.lock().unwrap();
        if let Some(card) = state.sales.iter_mut().find(|c| c.id == OpportunityId(id)) {
            card.stage = stage;
        }
    }

    pub fn stage_of(&self, id: i64) -> Option<Stage> {
        let state = self.state.lock().unwrap();
        state
            .sales
            .iter()
            .find(|c| c.id == OpportunityId(id))
            .map(|c| c.stage)
    }

    fn snapshot(&self) -> PipelinePayload {
        self.state.lock().unwrap().sales.iter().cloned().collect()
    }
}

fn server_error(message: &str) -> ApiClientError {
    ApiClientError::Status {
        status: 500,
        message: message.to_string(),
    }
}

fn not_found() -> ApiClientError {
    ApiClientError::Status {
        status: 404,
        message: "Not found.".to_string(),
    }
}

#[async_trait]
impl SalesBackend for InMemoryBackend {
    async fn fetch_pipeline(&self, params: &PipelineParams) -> Result<PipelinePayload, ApiClientError> {
        let state = self.state.lock().unwrap();
        if state.fail_pipeline {
            return Err(server_error("pipeline unavailable"));
        }
        let needle = params.search.clone().unwrap_or_default().to_lowercase();
        Ok(state
            .sales
            .iter()
            .filter(|c| c.matches_lowercase(&needle))
            .cloned()
            .collect())
    }

    async fn update_status(&self, id: OpportunityId, stage: Stage) -> Result<(), ApiClientError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_update.contains(&id) {
            return Err(server_error("status update refused"));
        }
        let card = state
            .sales
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(not_found)?;
        card.stage = stage;
        Ok(())
    }

    async fn delete_sale(&self, id: OpportunityId) -> Result<(), ApiClientError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_delete.contains(&id) {
            return Err(server_error("delete refused"));
        }
        let before = state.sales.len();
        state.sales.retain(|c| c.id != id);
        if state.sales.len() == before {
            return Err(not_found());
        }
        Ok(())
    }

    /// Counts per stage, with `total_value` summed over every stage like the
    /// real endpoint does.
    async fn fetch_stats(&self) -> Result<Stats, ApiClientError> {
        let snapshot = self.snapshot();
        let mut stats = Stats::derive_from(&OpportunityStore::from_payload(snapshot.clone()));
        stats.total_value = snapshot.into_stages().flat_map(|(_, cards)| cards).map(|c| c.amount).sum();
        Ok(stats)
    }

    async fn list_sales(&self, params: &ListParams) -> Result<Page<Opportunity>, ApiClientError> {
        let state = self.state.lock().unwrap();
        let needle = params.search.clone().unwrap_or_default().to_lowercase();
        let matching: Vec<Opportunity> = state
            .sales
            .iter()
            .filter(|c| c.matches_lowercase(&needle))
            .filter(|c| params.status.map_or(true, |s| c.stage == s))
            .cloned()
            .collect();
        let results = matching
            .iter()
            .skip(params.offset as usize)
            .take(params.limit as usize)
            .cloned()
            .collect();
        Ok(Page {
            count: matching.len() as u64,
            results,
        })
    }
}

/// Next backend result from the loop channel, or panic after a timeout.
pub async fn next_backend(rx: &mut mpsc::Receiver<TuiEvent>) -> BackendEvent {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for a backend event")
            .expect("event channel closed");
        if let TuiEvent::Backend(event) = event {
            return event;
        }
    }
}

/// Collect `n` backend results in arrival order.
pub async fn take_backend(rx: &mut mpsc::Receiver<TuiEvent>, n: usize) -> Vec<BackendEvent> {
    let mut events = Vec::with_capacity(n);
    for _ in 0..n {
        events.push(next_backend(rx).await);
    }
    events
}

/// True when nothing arrives within a short window.
pub async fn stays_quiet(rx: &mut mpsc::Receiver<TuiEvent>) -> bool {
    tokio::time::timeout(Duration::from_millis(150), rx.recv())
        .await
        .is_err()
}
