//! Shared test helpers for schema tests.

use assurance_core::{EmbeddingProvider, ProviderError, Schema};
use serde_json::json;

const VOCABULARY: [&str; 8] = [
    "analytics",
    "edge",
    "lifecycle",
    "places",
    "request",
    "response",
    "start",
    "identity",
];

/// A deterministic embedder: one dimension per vocabulary word, valued by
/// how often the word occurs in the text.
#[derive(Default)]
pub struct KeywordEmbedder {
    fail: bool,
}

impl KeywordEmbedder {
    pub fn failing() -> Self {
        Self { fail: true }
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        VOCABULARY
            .iter()
            .map(|w| lower.matches(w).count() as f32)
            .collect()
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    fn name(&self) -> &str {
        "keyword_mock"
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if self.fail {
            return Err(ProviderError::Network("embedding service unreachable".into()));
        }
        Ok(inputs.iter().map(|t| Self::vector(t)).collect())
    }
}

/// Build a minimal valid schema.
pub fn schema(name: &str, event_type: &str, source: &str, desc: &str) -> Schema {
    Schema::from_value(
        name,
        json!({
            "shortDesc": desc,
            "required": ["uuid", "payload"],
            "properties": { "payload": { "properties": {
                "ACPExtensionEventType": { "const": event_type },
                "ACPExtensionEventSource": { "const": source }
            }}}
        }),
    )
    .unwrap()
}
