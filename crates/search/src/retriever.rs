//! Retriever abstraction.

use crate::types::DocumentSet;
use textfusion_core::AppResult;

/// Fetches ranked documents for a query from a search service.
///
/// The retrieval width is fixed when the implementation is constructed and
/// never varies per call. Failures are reported as `AppError::Retrieval`
/// and are not retried.
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    /// Get the search service name (e.g., "tavily").
    fn provider_name(&self) -> &str;

    /// Maximum number of documents a call returns.
    fn max_results(&self) -> usize;

    /// Retrieve up to `max_results` documents in relevance order.
    ///
    /// Fewer results than requested is not an error.
    async fn retrieve(&self, query: &str) -> AppResult<DocumentSet>;
}
