//! Token counters backed by real model tokenizers.
//!
//! The default is a tiktoken BPE encoding matching the completion model.
//! With the `huggingface` feature a `tokenizer.json` can be loaded instead.

use assurance_config::TokenizerConfig;
use assurance_core::{Error, Result, TokenCounter};
use std::sync::Arc;
use tiktoken_rs::CoreBPE;
use tracing::debug;

/// A tiktoken BPE encoding.
pub struct TiktokenCounter {
    encoding: String,
    bpe: CoreBPE,
}

impl TiktokenCounter {
    /// Load a named encoding: `cl100k_base`, `o200k_base`, `p50k_base` or
    /// `r50k_base`.
    pub fn new(encoding: &str) -> Result<Self> {
        let bpe = match encoding {
            "cl100k_base" => tiktoken_rs::cl100k_base(),
            "o200k_base" => tiktoken_rs::o200k_base(),
            "p50k_base" => tiktoken_rs::p50k_base(),
            "r50k_base" => tiktoken_rs::r50k_base(),
            other => {
                return Err(Error::Config {
                    message: format!("unknown tokenizer encoding '{other}'"),
                });
            }
        }
        .map_err(|e| Error::Config {
            message: format!("failed to load '{encoding}' encoding: {e}"),
        })?;

        Ok(Self {
            encoding: encoding.to_string(),
            bpe,
        })
    }

    /// The GPT-3.5 / GPT-4 encoding.
    pub fn cl100k() -> Result<Self> {
        Self::new("cl100k_base")
    }
}

impl TokenCounter for TiktokenCounter {
    fn name(&self) -> &str {
        &self.encoding
    }

    fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        self.bpe.encode_with_special_tokens(text).len()
    }
}

/// A Hugging Face `tokenizer.json`.
#[cfg(feature = "huggingface")]
pub struct HfTokenCounter {
    name: String,
    tokenizer: tokenizers::Tokenizer,
}

#[cfg(feature = "huggingface")]
impl HfTokenCounter {
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let tokenizer = tokenizers::Tokenizer::from_file(path).map_err(|e| Error::Config {
            message: format!("failed to load tokenizer {}: {e}", path.display()),
        })?;
        Ok(Self {
            name: path.display().to_string(),
            tokenizer,
        })
    }
}

#[cfg(feature = "huggingface")]
impl TokenCounter for HfTokenCounter {
    fn name(&self) -> &str {
        &self.name
    }

    fn count(&self, text: &str) -> usize {
        match self.tokenizer.encode(text, false) {
            Ok(encoding) => encoding.len(),
            Err(e) => {
                // Byte length bounds the token count from above.
                tracing::warn!(tokenizer = %self.name, "Tokenization failed: {e}");
                text.len()
            }
        }
    }
}

/// Build the configured counter. A tokenizer path takes precedence over the
/// named encoding.
pub fn counter_from_config(config: &TokenizerConfig) -> Result<Arc<dyn TokenCounter>> {
    if let Some(path) = &config.path {
        #[cfg(feature = "huggingface")]
        {
            debug!(path = %path.display(), "Loading Hugging Face tokenizer");
            return Ok(Arc::new(HfTokenCounter::from_file(path)?));
        }
        #[cfg(not(feature = "huggingface"))]
        {
            return Err(Error::Config {
                message: format!(
                    "tokenizer.path is set to {} but this build lacks the 'huggingface' feature",
                    path.display()
                ),
            });
        }
    }

    debug!(encoding = %config.encoding, "Loading tiktoken encoding");
    Ok(Arc::new(TiktokenCounter::new(&config.encoding)?))
}
