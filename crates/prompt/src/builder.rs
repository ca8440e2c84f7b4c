//! Prompt assembler: renders the question and retrieved documents into one
//! prompt text.

use crate::types::{BuiltPrompt, BuiltPromptMetadata, ContextSource, PromptDefinition};
use handlebars::Handlebars;
use std::collections::HashMap;
use textfusion_core::{AppError, AppResult};

const TEMPLATE_NAME: &str = "prompt";

/// Renders prompts from a single, pre-registered definition.
///
/// The template is registered and test-rendered once in [`PromptAssembler::new`],
/// so a broken custom template fails at startup instead of on the first
/// search. After that, [`PromptAssembler::assemble`] is deterministic and
/// performs no I/O.
pub struct PromptAssembler {
    definition: PromptDefinition,
    handlebars: Handlebars<'static>,
}

impl PromptAssembler {
    /// Register the definition's template.
    ///
    /// # Example
    /// ```
    /// use textfusion_prompt::{PromptAssembler, PromptDefinition};
    ///
    /// let assembler = PromptAssembler::new(PromptDefinition::default()).unwrap();
    /// let prompt = assembler.assemble::<(String, String, String)>("What is Rust?", &[]).unwrap();
    /// assert!(prompt.user.ends_with("Question: What is Rust?"));
    /// ```
    pub fn new(definition: PromptDefinition) -> AppResult<Self> {
        let mut handlebars = Handlebars::new();

        // Plain text output, no HTML escaping
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.set_strict_mode(true);

        handlebars
            .register_template_string(TEMPLATE_NAME, definition.template.clone())
            .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

        let assembler = Self {
            definition,
            handlebars,
        };

        assembler.render(&assembler.variables("", String::new()))?;
        tracing::debug!("Registered prompt template: {}", assembler.definition.id);

        Ok(assembler)
    }

    /// The definition this assembler renders.
    pub fn definition(&self) -> &PromptDefinition {
        &self.definition
    }

    /// Render the prompt for `question` with `documents` as context.
    ///
    /// Documents appear in the given order. An empty slice produces an empty
    /// context section, not an error.
    pub fn assemble<D: ContextSource>(
        &self,
        question: &str,
        documents: &[D],
    ) -> AppResult<BuiltPrompt> {
        let context = render_context(documents);
        let user = self.render(&self.variables(question, context))?;

        tracing::debug!(
            prompt_id = %self.definition.id,
            documents = documents.len(),
            prompt_bytes = user.len(),
            "Assembled prompt"
        );

        Ok(BuiltPrompt {
            system: self.definition.system.clone(),
            user,
            metadata: BuiltPromptMetadata {
                source_prompt_id: self.definition.id.clone(),
                document_count: documents.len(),
            },
        })
    }

    fn variables(&self, question: &str, context: String) -> HashMap<&'static str, String> {
        let mut variables = HashMap::new();
        variables.insert("instruction", self.definition.instruction.clone());
        variables.insert("context", context);
        variables.insert("question", question.to_string());
        variables
    }

    fn render(&self, variables: &HashMap<&'static str, String>) -> AppResult<String> {
        self.handlebars
            .render(TEMPLATE_NAME, variables)
            .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
    }
}

/// Render documents as numbered context blocks.
///
/// Each block keeps the document's source so the model can cite it:
///
/// ```text
/// [1] France
/// Source: https://example.com/a
/// Paris is the capital of France.
/// ```
///
/// Blocks are separated by a blank line.
pub fn render_context<D: ContextSource>(documents: &[D]) -> String {
    documents
        .iter()
        .enumerate()
        .map(|(i, doc)| {
            let header = format!("[{}] {}", i + 1, doc.title());
            format!(
                "{}\nSource: {}\n{}",
                header.trim_end(),
                doc.source(),
                doc.content()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Tuple form `(source, title, content)`, convenient for tests and docs.
impl ContextSource for (String, String, String) {
    fn source(&self) -> &str {
        &self.0
    }

    fn title(&self) -> &str {
        &self.1
    }

    fn content(&self) -> &str {
        &self.2
    }
}
