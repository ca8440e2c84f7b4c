//! Web search answering for TextFusion.
//!
//! Retrieves a handful of web search results for a question, renders them
//! into the prompt, and asks the completion model for a cited answer.
//!
//! ```no_run
//! use textfusion_core::AppConfig;
//! use textfusion_search::SearchEngine;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let engine = SearchEngine::from_config(&config)?;
//! let answer = engine.search("What is the capital of France?").await?;
//! println!("{}", answer);
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod providers;
pub mod retriever;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use engine::SearchEngine;
pub use providers::TavilyRetriever;
pub use retriever::Retriever;
pub use types::{Document, DocumentSet};
