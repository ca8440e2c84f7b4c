//! Stage fakes for exercising the front ends without network access.

use futures::stream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use textfusion_core::{AppError, AppResult};
use textfusion_llm::{LlmClient, LlmRequest, LlmResponse, LlmStream, LlmStreamChunk, LlmUsage};
use textfusion_prompt::{PromptAssembler, PromptDefinition};
use textfusion_search::{Document, DocumentSet, Retriever, SearchEngine};

pub(crate) struct CountingRetriever {
    fail: bool,
    calls: AtomicUsize,
}

impl CountingRetriever {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Retriever for CountingRetriever {
    fn provider_name(&self) -> &str {
        "counting"
    }

    fn max_results(&self) -> usize {
        3
    }

    async fn retrieve(&self, _query: &str) -> AppResult<DocumentSet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Retrieval(
                "Tavily API error (401 Unauthorized): invalid key".to_string(),
            ));
        }
        Ok(DocumentSet::ranked(
            vec![Document::new(
                "https://example.com/a",
                "France",
                "Paris is the capital of France.",
            )],
            3,
        ))
    }
}

pub(crate) struct ScriptedLlm {
    reply: String,
    calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(LlmResponse {
            content: self.reply.clone(),
            model: request.model.clone(),
            usage: LlmUsage::new(20, 8),
            finish_reason: Some("stop".to_string()),
        })
    }

    async fn stream(&self, request: &LlmRequest) -> AppResult<LlmStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Split halfway by characters so multi-byte replies stay intact
        let mid = self
            .reply
            .char_indices()
            .nth(self.reply.chars().count() / 2)
            .map_or(self.reply.len(), |(i, _)| i);
        let (head, tail) = self.reply.split_at(mid);
        let chunk = |content: &str, done: bool| -> AppResult<LlmStreamChunk> {
            Ok(LlmStreamChunk {
                content: content.to_string(),
                model: request.model.clone(),
                done,
                usage: done.then(|| LlmUsage::new(20, 8)),
            })
        };
        let chunks = vec![chunk(head, false), chunk(tail, false), chunk("", true)];
        Ok(Box::pin(stream::iter(chunks)))
    }
}

fn build(
    reply: &str,
    fail: bool,
) -> (SearchEngine, Arc<CountingRetriever>, Arc<ScriptedLlm>) {
    let retriever = Arc::new(CountingRetriever {
        fail,
        calls: AtomicUsize::new(0),
    });
    let llm = Arc::new(ScriptedLlm {
        reply: reply.to_string(),
        calls: AtomicUsize::new(0),
    });
    let assembler = PromptAssembler::new(PromptDefinition::default()).unwrap();
    let engine = SearchEngine::new(
        retriever.clone(),
        llm.clone(),
        assembler,
        "test-model",
        0.0,
    );
    (engine, retriever, llm)
}

/// Engine whose completion stage always answers `reply`.
pub(crate) fn engine(reply: &str) -> (SearchEngine, Arc<CountingRetriever>, Arc<ScriptedLlm>) {
    build(reply, false)
}

/// Engine whose retrieval stage always fails.
pub(crate) fn failing_engine() -> (SearchEngine, Arc<CountingRetriever>, Arc<ScriptedLlm>) {
    build("unused", true)
}
