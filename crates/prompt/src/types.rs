//! Prompt types for TextFusion.

use serde::{Deserialize, Serialize};

/// Instruction given to the model ahead of the retrieved context.
pub const DEFAULT_INSTRUCTION: &str = "You are a intelligent search agent who can provide \
comprehensive answers to any user query developed by TextFusion.AI The agent should answer \
the question based only on the context provided. Make the answer as comprehensive as \
possible. Use citations for the sources.";

/// Layout of the rendered prompt.
pub const DEFAULT_TEMPLATE: &str =
    "{{instruction}}\n\nContext: {{context}}\n\nQuestion: {{question}}";

/// A document that can be rendered into the prompt context.
///
/// Implemented by the retriever's document type; the prompt crate only
/// needs these three views of it.
pub trait ContextSource {
    /// Where the document came from (typically a URL)
    fn source(&self) -> &str;

    /// Display label
    fn title(&self) -> &str;

    /// Text excerpt used as context
    fn content(&self) -> &str;
}

/// A prompt definition, built in or loaded from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// Role/instruction text, available to the template as `instruction`
    #[serde(default = "default_instruction")]
    pub instruction: String,

    /// System message sent ahead of the rendered prompt, verbatim
    #[serde(default)]
    pub system: Option<String>,

    /// Template string with Handlebars syntax.
    ///
    /// Available variables: `instruction`, `context`, `question`.
    #[serde(default = "default_template")]
    pub template: String,
}

fn default_instruction() -> String {
    DEFAULT_INSTRUCTION.to_string()
}

fn default_template() -> String {
    DEFAULT_TEMPLATE.to_string()
}

impl Default for PromptDefinition {
    fn default() -> Self {
        Self {
            id: "search.default".to_string(),
            title: "TextFusion search".to_string(),
            api_version: "1.0".to_string(),
            created_by: "textfusion".to_string(),
            instruction: default_instruction(),
            system: None,
            template: default_template(),
        }
    }
}

/// A fully rendered prompt ready for the completion client.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltPromptMetadata {
    /// Source prompt ID
    pub source_prompt_id: String,

    /// Number of documents rendered into the context
    pub document_count: usize,
}
