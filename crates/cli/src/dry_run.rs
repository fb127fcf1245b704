//! A completion provider that never leaves the machine.
//!
//! It answers every request with a summary of what would have been sent,
//! so the whole pipeline can be exercised without a model endpoint.

use assurance_core::{
    Completion, CompletionProvider, CompletionRequest, ProviderError, TokenCounter, Usage,
};
use async_trait::async_trait;
use std::sync::Arc;

pub struct DryRunProvider {
    counter: Arc<dyn TokenCounter>,
    echo: bool,
}

impl DryRunProvider {
    pub fn new(counter: Arc<dyn TokenCounter>) -> Self {
        Self {
            counter,
            echo: false,
        }
    }

    /// Include the full rendered prompt in every answer.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }
}

#[async_trait]
impl CompletionProvider for DryRunProvider {
    fn name(&self) -> &str {
        "dry_run"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ProviderError> {
        let prompt = request.render();
        let prompt_tokens = self.counter.count(&prompt);
        tracing::debug!(model = %request.model, prompt_tokens, "Dry run completion");

        let mut text = format!(
            "Dry run: a {prompt_tokens}-token prompt would be sent to {}.",
            request.model
        );
        if self.echo {
            text.push('\n');
            text.push_str(&prompt);
        }

        Ok(Completion {
            text,
            model: request.model,
            usage: Some(Usage {
                prompt_tokens: prompt_tokens as u32,
                completion_tokens: 0,
                total_tokens: prompt_tokens as u32,
            }),
        })
    }
}
