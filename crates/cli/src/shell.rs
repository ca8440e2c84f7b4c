//! Input guard shared by every front end.

use textfusion_core::AppResult;
use textfusion_search::SearchEngine;

/// Placeholder text shown in an empty search box.
pub const PLACEHOLDER: &str = "Search...";

/// Whether `query` should reach the pipeline at all.
///
/// Blank input and the untouched placeholder are ignored.
pub fn should_dispatch(query: &str) -> bool {
    let query = query.trim();
    !query.is_empty() && query != PLACEHOLDER
}

/// Header printed above an answer.
pub fn results_header(query: &str) -> String {
    format!("Search results for: '{}'", query.trim())
}

/// Run one search if the guard lets `query` through.
///
/// Returns `None` when the query was filtered out and the engine was never
/// called.
pub async fn handle_query(engine: &SearchEngine, query: &str) -> Option<AppResult<String>> {
    if !should_dispatch(query) {
        tracing::debug!("Ignoring empty query");
        return None;
    }

    Some(engine.search(query.trim()).await)
}
