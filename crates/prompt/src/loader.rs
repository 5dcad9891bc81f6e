//! Prompt loader for loading YAML prompt definitions.

use crate::types::{PromptDefinition, DEFAULT_PROMPT_ID};
use groundwork_core::{AppError, AppResult};
use std::path::Path;

const PROMPTS_DIR: &str = ".groundwork/prompts";

/// Load a prompt definition by ID from the workspace.
///
/// This function searches for a prompt file named `<id>.yml` in the
/// `.groundwork/prompts/` directory.
///
/// # Arguments
/// * `workspace_path` - Root workspace directory containing `.groundwork/`
/// * `prompt_id` - Prompt identifier (e.g., "assistant.grounded")
///
/// # Returns
/// A parsed `PromptDefinition` or an error if not found/invalid.
///
/// # Example
/// ```no_run
/// use groundwork_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let workspace = Path::new(".");
/// let prompt = load_prompt(workspace, "assistant.grounded")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = workspace_path
        .join(PROMPTS_DIR)
        .join(format!("{}.yml", prompt_id));

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Load a prompt from the workspace, falling back to the built-in definition.
///
/// Only a missing file for the default ID falls back; a present but
/// invalid file is still an error.
pub fn load_or_builtin(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = workspace_path
        .join(PROMPTS_DIR)
        .join(format!("{}.yml", prompt_id));

    if !prompt_file.exists() && prompt_id == DEFAULT_PROMPT_ID {
        tracing::debug!("Using built-in prompt: {}", prompt_id);
        return Ok(PromptDefinition::builtin());
    }

    load_prompt(workspace_path, prompt_id)
}

/// List all available prompt IDs in the workspace.
///
/// The built-in prompt is always listed.
pub fn list_prompts(workspace_path: &Path) -> AppResult<Vec<String>> {
    let prompts_dir = workspace_path.join(PROMPTS_DIR);
    let mut prompt_ids = vec![DEFAULT_PROMPT_ID.to_string()];

    if !prompts_dir.exists() {
        return Ok(prompt_ids);
    }

    for entry in walkdir::WalkDir::new(&prompts_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if stem != DEFAULT_PROMPT_ID {
                    prompt_ids.push(stem.to_string());
                }
            }
        }
    }

    prompt_ids[1..].sort();
    Ok(prompt_ids)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.persona.trim().is_empty() {
        return Err(AppError::Prompt("Prompt persona cannot be empty".to_string()));
    }

    if !def.context_directive.contains("{{context}}") {
        return Err(AppError::Prompt(format!(
            "Prompt {} contextDirective must reference {{{{context}}}}",
            def.id
        )));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_test_prompt(dir: &Path, id: &str, valid: bool) -> PathBuf {
        let prompts_dir = dir.join(PROMPTS_DIR);
        fs::create_dir_all(&prompts_dir).unwrap();

        let content = if valid {
            format!(
                r#"
id: {}
title: "Test Prompt"
apiVersion: "1.0"
persona: "You answer questions about bicycles."
contextDirective: "Use these facts:\n{{{{context}}}}"
noContextDirective: "Ask which bicycle they mean."
"#,
                id
            )
        } else {
            "invalid: yaml: content:".to_string()
        };

        let file_path = prompts_dir.join(format!("{}.yml", id));
        fs::write(&file_path, content).unwrap();
        file_path
    }

    #[test]
    fn test_load_valid_prompt() {
        let temp_dir = TempDir::new().unwrap();
        create_test_prompt(temp_dir.path(), "test.prompt", true);

        let prompt = load_prompt(temp_dir.path(), "test.prompt").unwrap();
        assert_eq!(prompt.id, "test.prompt");
        assert_eq!(prompt.title, "Test Prompt");
        assert!(prompt.context_directive.ends_with("{{context}}"));
    }

    #[test]
    fn test_load_nonexistent_prompt() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_prompt(temp_dir.path(), "nonexistent");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_dir = TempDir::new().unwrap();
        create_test_prompt(temp_dir.path(), "invalid", false);

        let result = load_prompt(temp_dir.path(), "invalid");
        assert!(result.is_err());
    }

    #[test]
    fn test_builtin_fallback_only_for_default_id() {
        let temp_dir = TempDir::new().unwrap();

        let def = load_or_builtin(temp_dir.path(), DEFAULT_PROMPT_ID).unwrap();
        assert_eq!(def, PromptDefinition::builtin());

        assert!(load_or_builtin(temp_dir.path(), "custom").is_err());
    }

    #[test]
    fn test_workspace_file_overrides_builtin() {
        let temp_dir = TempDir::new().unwrap();
        create_test_prompt(temp_dir.path(), DEFAULT_PROMPT_ID, true);

        let def = load_or_builtin(temp_dir.path(), DEFAULT_PROMPT_ID).unwrap();
        assert_eq!(def.persona, "You answer questions about bicycles.");
    }

    #[test]
    fn test_list_prompts() {
        let temp_dir = TempDir::new().unwrap();
        create_test_prompt(temp_dir.path(), "prompt2", true);
        create_test_prompt(temp_dir.path(), "prompt1", true);

        let prompts = list_prompts(temp_dir.path()).unwrap();
        assert_eq!(prompts, vec![DEFAULT_PROMPT_ID, "prompt1", "prompt2"]);
    }
}
