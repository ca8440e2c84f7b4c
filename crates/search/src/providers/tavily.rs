//! Tavily search API adapter.
//!
//! API reference: https://docs.tavily.com/documentation/api-reference/endpoint/search

use crate::retriever::Retriever;
use crate::types::{Document, DocumentSet};
use serde::{Deserialize, Serialize};
use textfusion_core::{ApiKey, AppError, AppResult};

/// Default Tavily API base URL.
pub const DEFAULT_ENDPOINT: &str = "https://api.tavily.com";

/// Tavily search request body.
#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    max_results: usize,
    search_depth: &'static str,
}

/// Tavily search response body. Fields we don't use are ignored.
#[derive(Debug, Deserialize)]
struct TavilyResponse {
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: Option<f32>,
}

impl From<TavilyResult> for Document {
    fn from(result: TavilyResult) -> Self {
        Document {
            url: result.url,
            title: result.title,
            content: result.content,
            score: result.score,
        }
    }
}

/// Retriever backed by the Tavily search API.
pub struct TavilyRetriever {
    /// Base URL of the API (without `/search`)
    base_url: String,

    api_key: ApiKey,

    /// Retrieval width (k)
    max_results: usize,

    /// HTTP client
    client: reqwest::Client,
}

impl TavilyRetriever {
    /// Create a retriever returning at most `max_results` documents.
    pub fn new(api_key: ApiKey, max_results: usize) -> Self {
        Self {
            base_url: DEFAULT_ENDPOINT.to_string(),
            api_key,
            max_results,
            client: reqwest::Client::new(),
        }
    }

    /// Point the retriever at a different base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/search", self.base_url)
    }

    fn to_request<'a>(&self, query: &'a str) -> TavilyRequest<'a> {
        TavilyRequest {
            query,
            max_results: self.max_results,
            search_depth: "basic",
        }
    }
}

#[async_trait::async_trait]
impl Retriever for TavilyRetriever {
    fn provider_name(&self) -> &str {
        "tavily"
    }

    fn max_results(&self) -> usize {
        self.max_results
    }

    async fn retrieve(&self, query: &str) -> AppResult<DocumentSet> {
        if query.trim().is_empty() {
            return Err(AppError::Retrieval("Query cannot be empty".to_string()));
        }

        tracing::info!(max_results = self.max_results, "Sending search request to Tavily");
        tracing::debug!("Query: {}", query);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose())
            .json(&self.to_request(query))
            .send()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to send request to Tavily: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Retrieval(format!(
                "Tavily API error ({}): {}",
                status, error_text
            )));
        }

        let tavily_response: TavilyResponse = response
            .json()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to parse Tavily response: {}", e)))?;

        let documents = DocumentSet::ranked(
            tavily_response
                .results
                .into_iter()
                .map(Document::from)
                .collect(),
            self.max_results,
        );

        tracing::info!("Retrieved {} documents from Tavily", documents.len());
        for (i, doc) in documents.iter().enumerate() {
            tracing::debug!(rank = i + 1, url = %doc.url, score = ?doc.score, "Search result");
        }

        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriever_creation() {
        let retriever = TavilyRetriever::new(ApiKey::new("tvly-test"), 3);
        assert_eq!(retriever.provider_name(), "tavily");
        assert_eq!(retriever.max_results(), 3);
        assert_eq!(retriever.endpoint(), "https://api.tavily.com/search");
    }

    #[test]
    fn test_request_conversion() {
        let retriever = TavilyRetriever::new(ApiKey::new("tvly-test"), 3);
        let body = serde_json::to_value(retriever.to_request("rust async")).unwrap();

        assert_eq!(body["query"], "rust async");
        assert_eq!(body["max_results"], 3);
        assert_eq!(body["search_depth"], "basic");
        // The key travels in the Authorization header only
        assert!(body.get("api_key").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{
            "query": "capital of france",
            "results": [
                {"title": "France", "url": "https://example.com/a", "content": "Paris is the capital of France.", "score": 0.98},
                {"url": "https://example.com/b"}
            ],
            "response_time": 1.2
        }"#;
        let parsed: TavilyResponse = serde_json::from_str(raw).unwrap();
        let docs: Vec<Document> = parsed.results.into_iter().map(Document::from).collect();

        assert_eq!(docs[0].url, "https://example.com/a");
        assert_eq!(docs[0].title, "France");
        assert_eq!(docs[0].content, "Paris is the capital of France.");
        assert!((docs[0].score.unwrap() - 0.98).abs() < 1e-6);
        assert_eq!(docs[1].title, "");
        assert_eq!(docs[1].content, "");
        assert_eq!(docs[1].score, None);
    }

    #[test]
    fn test_response_without_results_is_malformed() {
        let parsed = serde_json::from_str::<TavilyResponse>(r#"{"query": "x"}"#);
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn test_empty_query_rejected_without_request() {
        let retriever = TavilyRetriever::new(ApiKey::new("tvly-test"), 3)
            .with_base_url("http://127.0.0.1:9");
        let err = retriever.retrieve("   ").await.unwrap_err();
        assert!(matches!(err, AppError::Retrieval(_)));
        assert!(err.to_string().contains("empty"));
    }
}
