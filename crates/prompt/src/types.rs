//! Prompt types for Groundwork.
//!
//! This module defines the domain entities for the prompt system.

use serde::{Deserialize, Serialize};

/// Identifier of the built-in grounded assistant prompt.
pub const DEFAULT_PROMPT_ID: &str = "assistant.grounded";

const DEFAULT_PERSONA: &str = "You are a professional and knowledgeable sales assistant specializing in custom headwear and branded caps. Your role is to help customers find the right products, provide accurate pricing information, and explain customization options.

**CORE PRINCIPLES:**
- Provide accurate product information based on the catalog data
- Help customers find products that match their needs (style, features, price, colors)
- Explain pricing tiers, embroidery options, and customization clearly
- Mention stock availability when relevant

**WHEN ANSWERING QUESTIONS:**
- Start with the most relevant products or information
- Use bullet points for product features and pricing tiers
- Provide product IDs for easy reference
- Calculate total pricing when asked (base price plus add-ons)
- Suggest alternatives if the exact request isn't available
- Ask clarifying questions about quantity, budget, or specific needs

Always base recommendations on the retrieved catalog data.";

const DEFAULT_CONTEXT_DIRECTIVE: &str = "**RETRIEVED CATALOG INFORMATION:**
{{context}}

**Instructions:** Use this product catalog information to help the customer. Provide specific product recommendations with IDs, pricing for their quantity needs, and relevant features. Calculate total costs when customization is discussed. If the catalog doesn't have exactly what they need, suggest the closest alternatives.";

const DEFAULT_NO_CONTEXT_DIRECTIVE: &str = "**No specific catalog data retrieved - Ask the customer for more details about what they're looking for (style, quantity, budget, features) so you can search the catalog more effectively.**";

/// A prompt definition loaded from YAML.
///
/// The persona is the standing instruction; exactly one of the two
/// directives is appended to it when a grounded answer is generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Assistant persona and answering guidelines
    pub persona: String,

    /// Handlebars template used when retrieved context exists (`{{context}}`)
    #[serde(rename = "contextDirective")]
    pub context_directive: String,

    /// Directive used when nothing was retrieved
    #[serde(rename = "noContextDirective")]
    pub no_context_directive: String,
}

impl PromptDefinition {
    /// The built-in catalog assistant prompt.
    pub fn builtin() -> Self {
        Self {
            id: DEFAULT_PROMPT_ID.to_string(),
            title: "Grounded catalog assistant".to_string(),
            api_version: "1.0".to_string(),
            persona: DEFAULT_PERSONA.to_string(),
            context_directive: DEFAULT_CONTEXT_DIRECTIVE.to_string(),
            no_context_directive: DEFAULT_NO_CONTEXT_DIRECTIVE.to_string(),
        }
    }
}

/// Final-step system instruction, with a record of how it was built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundedPrompt {
    /// Persona followed by the chosen directive
    pub system: String,

    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Whether retrieved context was embedded
    #[serde(rename = "contextIncluded")]
    pub context_included: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_definition_deserialization() {
        let yaml = r#"
id: test.prompt
title: Test Prompt
apiVersion: "1.0"
persona: "You help with garden tools."
contextDirective: "Facts:\n{{context}}"
noContextDirective: "Ask what they need."
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "test.prompt");
        assert_eq!(def.persona, "You help with garden tools.");
        assert!(def.context_directive.contains("{{context}}"));
    }

    #[test]
    fn test_builtin_definition() {
        let def = PromptDefinition::builtin();
        assert_eq!(def.id, DEFAULT_PROMPT_ID);
        assert!(def.context_directive.contains("{{context}}"));
        assert!(def.no_context_directive.contains("Ask the customer"));
    }
}
