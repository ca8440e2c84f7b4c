//! Prompt assembly for TextFusion.
//!
//! Turns a question and its retrieved documents into the single text block
//! sent to the completion model:
//! - A built-in search prompt definition (replaceable from YAML)
//! - Handlebars template rendering
//! - Numbered, source-tagged context so the model can cite its sources

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{render_context, PromptAssembler};
pub use loader::load_prompt;
pub use types::{BuiltPrompt, BuiltPromptMetadata, ContextSource, PromptDefinition};
