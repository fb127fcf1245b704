//! Schema handling for the Assurance AI validator.
//!
//! - [`store`]: loads and holds the static schema documents
//! - [`index`]: embeds schemas for similarity search
//! - [`resolver`]: maps an extension or a request to the schema to validate against

pub mod index;
pub mod resolver;
pub mod store;
pub mod vector;

#[cfg(test)]
mod test_helpers;

pub use index::SchemaIndex;
pub use resolver::{
    ExactEntry, ExactStrategy, Resolution, ResolveError, ResolvedSchema, SchemaQuery,
    SchemaResolver, SemanticStrategy,
};
pub use store::SchemaStore;
pub use vector::{cosine_similarity, top_k};
