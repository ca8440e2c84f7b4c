//! Prompt loader for YAML prompt definitions.

use crate::types::PromptDefinition;
use std::path::Path;
use textfusion_core::{AppError, AppResult};

/// Load a prompt definition from a YAML file.
///
/// # Example
/// ```no_run
/// use textfusion_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new(".textfusion/prompts/search.yml"))?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(path: &Path) -> AppResult<PromptDefinition> {
    tracing::debug!("Loading prompt from: {:?}", path);

    if !path.exists() {
        return Err(AppError::Prompt(format!("Prompt file not found: {:?}", path)));
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| AppError::Prompt(format!("Failed to read prompt file {:?}: {}", path, e)))?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt YAML {:?}: {}", path, e))
    })?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    // The question is the one input every search prompt must carry
    if !references_variable(&def.template, "question") {
        return Err(AppError::Prompt(format!(
            "Prompt template '{}' never references {{{{question}}}}",
            def.id
        )));
    }

    if def.system.as_deref().is_some_and(|s| s.trim().is_empty()) {
        return Err(AppError::Prompt(
            "Prompt system message cannot be blank".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

/// Whether `template` has a `{{name}}` expression, whitespace and
/// whitespace-control markers (`~`) allowed.
fn references_variable(template: &str, name: &str) -> bool {
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            return false;
        };
        let expr = after[..end].trim_matches(|c: char| c == '{' || c == '~' || c.is_whitespace());
        if expr == name {
            return true;
        }
        rest = &after[end + 2..];
    }
    false
}
