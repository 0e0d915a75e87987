//! Search/filter gateway: one query shape, two result shapes.

use crate::api_client::ApiClientError;
use crate::traits::SalesBackend;
use dealboard_core::{ListParams, PipelineParams, SearchQuery, SearchResult, ViewRequest};
use std::sync::Arc;

#[derive(Clone)]
pub struct SearchGateway {
    backend: Arc<dyn SalesBackend>,
    page_size: u32,
}

impl SearchGateway {
    pub fn new(backend: Arc<dyn SalesBackend>, page_size: u32) -> Self {
        Self { backend, page_size }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Run `query` against the backend.
    ///
    /// The board always gets all six stages; the stage restriction only
    /// narrows the flat list.
    pub async fn search(&self, query: &SearchQuery, view: ViewRequest) -> Result<SearchResult, ApiClientError> {
        match view {
            ViewRequest::Board => {
                let params = PipelineParams::from(query);
                tracing::debug!(search = ?params.search, "Fetching pipeline");
                let payload = self.backend.fetch_pipeline(&params).await?;
                Ok(SearchResult::Board(payload))
            }
            ViewRequest::List { ordering, mut page } => {
                if page.per_page == 0 {
                    page.per_page = self.page_size;
                }
                let params = ListParams::new(query, ordering, page);
                tracing::debug!(
                    search = ?params.search,
                    status = ?params.status,
                    ordering = %params.ordering,
                    offset = params.offset,
                    "Fetching sales list"
                );
                let page = self.backend.list_sales(&params).await?;
                Ok(SearchResult::List(page))
            }
        }
    }
}
