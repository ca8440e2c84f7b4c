//! Search pipeline coordinator.
//!
//! Composes retrieval, prompt assembly and completion into one
//! `search(query) -> answer` call. The stages run strictly in sequence;
//! a failing stage stops the pipeline and every failure is reported as
//! `AppError::Search` carrying the original error's description.

use crate::providers::TavilyRetriever;
use crate::retriever::Retriever;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use textfusion_core::{AppConfig, AppError, AppResult};
use textfusion_llm::{create_client, LlmClient, LlmRequest, LlmStream};
use textfusion_prompt::{load_prompt, BuiltPrompt, PromptAssembler, PromptDefinition};

/// Answers questions from web search results.
///
/// Holds no per-request state; one engine can serve any number of
/// sequential or concurrent searches.
pub struct SearchEngine {
    retriever: Arc<dyn Retriever>,
    llm: Arc<dyn LlmClient>,
    assembler: PromptAssembler,
    model: String,
    temperature: f32,
}

impl SearchEngine {
    /// Assemble an engine from already-built stages.
    pub fn new(
        retriever: Arc<dyn Retriever>,
        llm: Arc<dyn LlmClient>,
        assembler: PromptAssembler,
        model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            retriever,
            llm,
            assembler,
            model: model.into(),
            temperature,
        }
    }

    /// Build the engine described by `config`.
    ///
    /// Validates the configuration first, so missing credentials or a broken
    /// prompt template fail here and no engine is constructed.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        config.validate()?;

        let definition = match config.prompt_file {
            Some(ref path) => load_prompt(path)?,
            None => PromptDefinition::default(),
        };
        let assembler = PromptAssembler::new(definition)?;

        let search_key = config.retriever.api_key.clone().ok_or_else(|| {
            AppError::Config(format!(
                "Search API key not found in environment variable: {}",
                config.retriever.api_key_env
            ))
        })?;
        let retriever = TavilyRetriever::new(search_key, config.retriever.max_results as usize)
            .with_base_url(&config.retriever.endpoint);

        let llm = create_client(
            &config.llm.provider,
            config.llm.endpoint.as_deref(),
            config.llm.api_key.as_ref(),
        )?;

        tracing::info!(
            retriever = retriever.provider_name(),
            max_results = retriever.max_results(),
            provider = llm.provider_name(),
            model = %config.llm.model,
            prompt = %assembler.definition().id,
            "Search engine ready"
        );

        Ok(Self::new(
            Arc::new(retriever),
            llm,
            assembler,
            config.llm.model.clone(),
            config.llm.temperature,
        ))
    }

    /// Model identifier used for completions.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Answer `query`: retrieve, assemble, complete.
    ///
    /// The answer is the model's text, verbatim.
    pub async fn search(&self, query: &str) -> AppResult<String> {
        self.run(query).await.map_err(|e| {
            tracing::warn!("Search failed: {}", e);
            e.into_search_failure()
        })
    }

    /// Like [`SearchEngine::search`], but yields the answer as it is generated.
    ///
    /// Errors while setting up the stream and errors inside it are both
    /// reported as `AppError::Search`.
    pub async fn search_stream(&self, query: &str) -> AppResult<LlmStream> {
        let stream = self.start_stream(query).await.map_err(|e| {
            tracing::warn!("Search failed: {}", e);
            e.into_search_failure()
        })?;

        Ok(Box::pin(
            stream.map(|chunk| chunk.map_err(AppError::into_search_failure)),
        ))
    }

    async fn run(&self, query: &str) -> AppResult<String> {
        let start = Instant::now();

        let prompt = self.prepare(query).await?;
        let response = self.llm.complete(&self.request(prompt)).await?;

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            answer_bytes = response.content.len(),
            "Search completed"
        );

        Ok(response.content)
    }

    async fn start_stream(&self, query: &str) -> AppResult<LlmStream> {
        let prompt = self.prepare(query).await?;
        self.llm.stream(&self.request(prompt).with_streaming()).await
    }

    /// Retrieval and prompt assembly. Documents are dropped once rendered.
    async fn prepare(&self, query: &str) -> AppResult<BuiltPrompt> {
        tracing::info!("Searching: {}", query);

        let documents = self.retriever.retrieve(query).await?;
        tracing::debug!(
            "Retrieved {} documents via {}",
            documents.len(),
            self.retriever.provider_name()
        );

        let prompt = self.assembler.assemble(query, documents.as_slice())?;
        tracing::debug!(
            prompt_id = %prompt.metadata.source_prompt_id,
            documents = prompt.metadata.document_count,
            system = prompt.system.is_some(),
            "Prompt ready"
        );

        Ok(prompt)
    }

    fn request(&self, prompt: BuiltPrompt) -> LlmRequest {
        let mut request =
            LlmRequest::new(prompt.user, &self.model).with_temperature(self.temperature);
        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }
        request
    }
}
