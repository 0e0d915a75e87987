//! Common traits for TUI components

use crate::api_client::ApiClientError;
use async_trait::async_trait;
use dealboard_core::{
    ListParams, Opportunity, OpportunityId, Page, PipelineParams, PipelinePayload, Stage, Stats,
};

/// The remote sales resource the board talks to.
///
/// Implemented by the REST client and by in-memory fakes in tests. The board
/// only ever sees these five calls.
#[async_trait]
pub trait SalesBackend: Send + Sync {
    /// Stage-partitioned opportunities matching `params`.
    async fn fetch_pipeline(&self, params: &PipelineParams) -> Result<PipelinePayload, ApiClientError>;

    /// Persist a stage change. `Ok` for any 2xx; an error means the change
    /// did not happen.
    async fn update_status(&self, id: OpportunityId, stage: Stage) -> Result<(), ApiClientError>;

    async fn delete_sale(&self, id: OpportunityId) -> Result<(), ApiClientError>;

    async fn fetch_stats(&self) -> Result<Stats, ApiClientError>;

    /// One page of the flat listing.
    async fn list_sales(&self, params: &ListParams) -> Result<Page<Opportunity>, ApiClientError>;
}
