//! The token cost model for prompt budgets.
//!
//! Implementations must agree with the tokenizer of the model that will
//! receive the prompt. Character or word counts drift far enough from real
//! token counts to overflow the context window or starve the prompt, so no
//! such counter is provided.

/// Counts model-tokenizer units in a piece of text.
pub trait TokenCounter: Send + Sync {
    /// Name of the underlying encoding (e.g. "cl100k_base").
    fn name(&self) -> &str;

    /// Number of tokens `text` occupies.
    fn count(&self, text: &str) -> usize;
}

impl<T: TokenCounter + ?Sized> TokenCounter for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn count(&self, text: &str) -> usize {
        (**self).count(text)
    }
}
