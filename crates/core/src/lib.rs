//! # Assurance Core
//!
//! Domain types, traits, and error definitions for the Assurance AI event
//! validator. It does not depend on an async runtime; it defines the
//! domain model that the schema and validator crates implement against.
//!
//! ## Design Philosophy
//!
//! External services (the completion model, the embedding model, the
//! tokenizer) are defined as traits here. Implementations live in their
//! respective crates or in the host application. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod descriptor;
pub mod error;
pub mod event;
pub mod extension;
pub mod provider;
pub mod schema;
pub mod token;

// Re-export key types at crate root for ergonomics
pub use descriptor::{DEFAULT_EVENT_COUNT, MatchDescriptor};
pub use error::{Error, ProviderError, Result, SchemaError};
pub use event::{Event, EventPayload, EventStore};
pub use extension::{ExtensionInfo, ExtensionRegistry};
pub use provider::{Completion, CompletionProvider, CompletionRequest, EmbeddingProvider, Usage};
pub use schema::Schema;
pub use token::TokenCounter;
