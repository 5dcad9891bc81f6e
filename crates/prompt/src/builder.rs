//! Prompt builder for rendering the grounded system instruction.

use crate::types::{GroundedPrompt, PromptDefinition};
use groundwork_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build the system instruction for a grounded answer.
///
/// With `context`, the persona is followed by the context directive rendered
/// with the retrieved text bound to `{{context}}`. Without it, the persona is
/// followed by the no-context directive, which asks the user for more detail.
///
/// # Example
/// ```no_run
/// use groundwork_prompt::{build_grounded_prompt, PromptDefinition};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = PromptDefinition::builtin();
/// let built = build_grounded_prompt(&def, Some("Source: catalog.json\nContent: ..."))?;
/// println!("{}", built.system);
/// # Ok(())
/// # }
/// ```
pub fn build_grounded_prompt(
    definition: &PromptDefinition,
    context: Option<&str>,
) -> AppResult<GroundedPrompt> {
    let directive = match context {
        Some(ctx) => {
            let mut variables = HashMap::new();
            variables.insert("context".to_string(), ctx.to_string());
            tracing::debug!(
                prompt = %definition.id,
                context_len = ctx.len(),
                "Injected retrieved context"
            );
            render_template(&definition.context_directive, &variables)?
        }
        None => definition.no_context_directive.clone(),
    };

    Ok(GroundedPrompt {
        system: format!("{}\n\n{}", definition.persona.trim_end(), directive.trim()),
        source_prompt_id: definition.id.clone(),
        context_included: context.is_some(),
    })
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Retrieved text is plain text, never HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("directive", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("directive", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_definition() -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            persona: "You sell caps.".to_string(),
            context_directive: "Facts:\n{{context}}\nUse them.".to_string(),
            no_context_directive: "Ask for details.".to_string(),
        }
    }

    #[test]
    fn test_render_simple_template() {
        let mut vars = HashMap::new();
        vars.insert("context".to_string(), "<b>caps</b> & visors".to_string());

        let rendered = render_template("Context: {{context}}", &vars).unwrap();
        assert_eq!(rendered, "Context: <b>caps</b> & visors");
    }

    #[test]
    fn test_build_with_context() {
        let def = create_test_definition();
        let built = build_grounded_prompt(&def, Some("Source: a\nContent: navy cap")).unwrap();

        assert_eq!(
            built.system,
            "You sell caps.\n\nFacts:\nSource: a\nContent: navy cap\nUse them."
        );
        assert!(built.context_included);
        assert_eq!(built.source_prompt_id, "test.prompt");
    }

    #[test]
    fn test_build_without_context() {
        let def = create_test_definition();
        let built = build_grounded_prompt(&def, None).unwrap();

        assert_eq!(built.system, "You sell caps.\n\nAsk for details.");
        assert!(!built.context_included);
    }

    #[test]
    fn test_context_is_not_reinterpreted_as_template() {
        let def = create_test_definition();
        let built = build_grounded_prompt(&def, Some("price {{qty}} tiers")).unwrap();
        assert!(built.system.contains("price {{qty}} tiers"));
    }

    #[test]
    fn test_invalid_template_is_prompt_error() {
        let mut def = create_test_definition();
        def.context_directive = "{{#if context}}unterminated".to_string();
        let result = build_grounded_prompt(&def, Some("x"));
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }
}
