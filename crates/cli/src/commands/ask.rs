//! Ask command handler.
//!
//! Answers one question and prints the result to stdout.

use crate::shell;
use clap::Args;
use futures::StreamExt;
use std::io::Write;
use std::path::PathBuf;
use textfusion_core::{config::AppConfig, AppError, AppResult};
use textfusion_search::SearchEngine;

/// Answer a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: Option<String>,

    /// Read the question from a file
    #[arg(short, long, conflicts_with = "question")]
    pub file: Option<PathBuf>,

    /// Print the answer as it is generated
    #[arg(long, conflicts_with = "json")]
    pub stream: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let question = self.get_question()?;
        if !shell::should_dispatch(&question) {
            return Err(AppError::Other("No question provided".to_string()));
        }

        let engine = SearchEngine::from_config(config)?;
        self.run(&engine, question.trim(), &mut std::io::stdout())
            .await
    }

    /// Search and write the answer to `out`.
    pub async fn run<W: Write>(
        &self,
        engine: &SearchEngine,
        question: &str,
        out: &mut W,
    ) -> AppResult<()> {
        eprintln!("Searching...");

        if self.stream {
            return self.run_streaming(engine, question, out).await;
        }

        let answer = engine.search(question).await?;

        if self.json {
            let output = serde_json::json!({
                "question": question,
                "answer": answer,
                "model": engine.model(),
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
        } else {
            writeln!(out, "{}\n", shell::results_header(question))?;
            writeln!(out, "{}", answer)?;
        }

        Ok(())
    }

    async fn run_streaming<W: Write>(
        &self,
        engine: &SearchEngine,
        question: &str,
        out: &mut W,
    ) -> AppResult<()> {
        let mut stream = engine.search_stream(question).await?;
        writeln!(out, "{}\n", shell::results_header(question))?;

        while let Some(result) = stream.next().await {
            let chunk = result?;

            if !chunk.content.is_empty() {
                write!(out, "{}", chunk.content)?;
                out.flush()?;
            }

            if chunk.done {
                if let Some(usage) = chunk.usage {
                    tracing::debug!(
                        "Token usage - Prompt: {}, Completion: {}, Total: {}",
                        usage.prompt_tokens,
                        usage.completion_tokens,
                        usage.total_tokens
                    );
                }
                break;
            }
        }

        // Newline after streamed output
        writeln!(out)?;
        Ok(())
    }

    /// Get the question from the argument or the file.
    fn get_question(&self) -> AppResult<String> {
        if let Some(ref question) = self.question {
            return Ok(question.clone());
        }

        match self.file {
            Some(ref path) => std::fs::read_to_string(path).map_err(|e| {
                AppError::Other(format!("Failed to read question file {:?}: {}", path, e))
            }),
            None => Err(AppError::Other("No question provided".to_string())),
        }
    }
}
