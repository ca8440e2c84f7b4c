//! In-process fakes for the pipeline stages.


use crate::retriever::Retriever;
use crate::types::{Document, DocumentSet};
use futures::stream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use textfusion_core::{AppError, AppResult};
use textfusion_llm::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};

/// Retriever returning a fixed result set, or a fixed failure.
pub(crate) struct FakeRetriever {
    documents: Vec<Document>,
    failure: Option<String>,
    max_results: usize,
    pub calls: AtomicUsize,
    pub last_query: Mutex<Option<String>>,
}

impl FakeRetriever {
    pub fn returning(documents: Vec<Document>) -> Self {
        Self {
            documents,
            failure: None,
            max_results: 3,
            calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::returning(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Retriever for FakeRetriever {
    fn provider_name(&self) -> &str {
        "fake"
    }

    fn max_results(&self) -> usize {
        self.max_results
    }

    async fn retrieve(&self, query: &str) -> AppResult<DocumentSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.to_string());

        match self.failure {
            Some(ref message) => Err(AppError::Retrieval(message.clone())),
            None => Ok(DocumentSet::ranked(
                self.documents.clone(),
                self.max_results,
            )),
        }
    }
}

/// Completion client that records the prompt it was given.
pub(crate) struct SpyLlm {
    reply: Result<String, String>,
    pub calls: AtomicUsize,
    pub last_request: Mutex<Option<LlmRequest>>,
}

impl SpyLlm {
    pub fn answering(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> String {
        self.last_request
            .lock()
            .unwrap()
            .as_ref()
            .map(|r| r.prompt.clone())
            .unwrap_or_default()
    }

    fn record(&self, request: &LlmRequest) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        self.reply.clone().map_err(AppError::Completion)
    }
}

#[async_trait::async_trait]
impl LlmClient for SpyLlm {
    fn provider_name(&self) -> &str {
        "spy"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let content = self.record(request)?;
        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::new(10, 5),
            finish_reason: Some("stop".to_string()),
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        let content = self.record(request)?;
        let model = request.model.clone();

        // One chunk per word, then the terminating chunk
        let mut chunks: Vec<AppResult<LlmStreamChunk>> = content
            .split_inclusive(' ')
            .map(|word| {
                Ok(LlmStreamChunk {
                    content: word.to_string(),
                    model: model.clone(),
                    done: false,
                    usage: None,
                })
            })
            .collect();
        chunks.push(Ok(LlmStreamChunk {
            content: String::new(),
            model,
            done: true,
            usage: Some(LlmUsage::new(10, 5)),
        }));

        Ok(Box::pin(stream::iter(chunks)))
    }
}
