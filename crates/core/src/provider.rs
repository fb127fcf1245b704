//! Provider traits over the completion and embedding models.
//!
//! The validator never talks to a model directly. It hands a rendered
//! prompt to a [`CompletionProvider`] and, for semantic schema lookup,
//! asks an [`EmbeddingProvider`] for vectors. Transport, authentication
//! and retries are the implementor's business.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;

/// Placeholder replaced by the schema text in a prompt template.
pub const SCHEMA_PLACEHOLDER: &str = "{schema}";
/// Placeholder replaced by the events text in a prompt template.
pub const EVENTS_PLACEHOLDER: &str = "{events}";
/// Placeholder replaced by the user's free-text request.
pub const PROMPT_PLACEHOLDER: &str = "{prompt}";

/// A single completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model or deployment to use.
    pub model: String,

    /// Prompt template containing the `{schema}` and `{events}` placeholders.
    pub template: String,

    /// Serialized schema text.
    pub schema_text: String,

    /// Serialized events text.
    pub events_text: String,

    /// Free-text validation intent, when the user supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_text: Option<String>,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Stop sequences
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,
}

fn default_temperature() -> f32 {
    0.9
}

impl CompletionRequest {
    /// The final prompt text with every placeholder substituted.
    ///
    /// Only placeholders in the template are replaced. Inserted schema, event
    /// and prompt text is copied verbatim, even when it contains a
    /// placeholder literal.
    pub fn render(&self) -> String {
        let substitutions = [
            (SCHEMA_PLACEHOLDER, self.schema_text.as_str()),
            (EVENTS_PLACEHOLDER, self.events_text.as_str()),
            (PROMPT_PLACEHOLDER, self.prompt_text.as_deref().unwrap_or("")),
        ];

        let mut out = String::with_capacity(
            self.template.len() + substitutions.iter().map(|(_, text)| text.len()).sum::<usize>(),
        );
        let mut rest = self.template.as_str();
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];
            match substitutions.iter().find(|(placeholder, _)| tail.starts_with(placeholder)) {
                Some((placeholder, text)) => {
                    out.push_str(text);
                    rest = &tail[placeholder.len()..];
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// A completed model response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    /// The generated text.
    pub text: String,

    /// Which model actually responded.
    pub model: String,

    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The completion model.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// A human-readable name for this provider.
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ProviderError>;
}

/// The embedding model backing semantic schema search.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Embed each input text. Returns one vector per input, in order.
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "gpt-35-turbo".into(),
            template: "Schema:\n{schema}\nEvents:\n{events}\nTask: {prompt}".into(),
            schema_text: "{\"required\": []}".into(),
            events_text: "[]".into(),
            prompt_text: None,
            max_tokens: Some(2000),
            temperature: default_temperature(),
            stop: vec!["EOF".into()],
        }
    }

    #[test]
    fn render_substitutes_placeholders() {
        let rendered = request().render();
        assert!(rendered.contains("Schema:\n{\"required\": []}"));
        assert!(rendered.contains("Events:\n[]"));
        assert!(rendered.ends_with("Task: "));
        assert!(!rendered.contains(EVENTS_PLACEHOLDER));
    }

    #[test]
    fn render_includes_prompt_text() {
        let mut req = request();
        req.prompt_text = Some("check the analytics hit".into());
        assert!(req.render().ends_with("Task: check the analytics hit"));
    }

    #[test]
    fn render_copies_inserted_text_verbatim() {
        let mut req = request();
        req.template = "S:{schema}\nE:{events}\nQ:{prompt}".into();
        req.schema_text = r#"{"description": "see {events}"}"#.into();
        req.events_text = r#"[{"note": "literal {prompt} in captured data"}]"#.into();
        req.prompt_text = Some("mention {schema} here".into());

        assert_eq!(
            req.render(),
            "S:{\"description\": \"see {events}\"}\n\
             E:[{\"note\": \"literal {prompt} in captured data\"}]\n\
             Q:mention {schema} here"
        );
    }

    #[test]
    fn render_keeps_other_braces() {
        let mut req = request();
        req.template = "function(events) { return {}; } {events} {unknown".into();
        assert_eq!(req.render(), "function(events) { return {}; } [] {unknown");
    }

    #[test]
    fn request_serialization_skips_empty_fields() {
        let mut req = request();
        req.stop.clear();
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("\"stop\""));
        assert!(!json.contains("prompt_text"));
        assert!(json.contains("gpt-35-turbo"));
    }
}
