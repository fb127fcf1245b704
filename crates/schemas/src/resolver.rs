//! Schema resolution — which schema should an extension's events be
//! validated against?
//!
//! Two strategies, selected by configuration:
//!
//! | Strategy | Input | Behaviour |
//! |----------|-------|-----------|
//! | Exact | extension key | Static map lookup, deterministic |
//! | Semantic | event text or free text | Nearest schema by embedding similarity, best effort |
//!
//! `Hybrid` tries the static map first and falls back to similarity search.
//! A semantic match may name a type/source that no captured event carries;
//! that shows up later as a "not matched" validation, never as an error here.

use crate::index::SchemaIndex;
use crate::store::SchemaStore;
use assurance_config::{ExtensionMatcher, ResolverStrategy, SchemaConfig};
use assurance_core::{MatchDescriptor, ProviderError, Schema};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Why a schema could not be resolved.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    #[error("No schema found for '{0}'")]
    NotFound(String),

    #[error("Similarity search failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Resolver not configured: {0}")]
    NotConfigured(String),
}

/// How a schema was found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    Exact,
    Semantic { score: f32 },
}

/// A resolved schema and the descriptor of the events it applies to.
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    pub schema: Arc<Schema>,
    pub resolution: Resolution,
}

/// What to resolve.
#[derive(Debug, Clone, Copy)]
pub enum SchemaQuery<'a> {
    /// A configured extension key, plus representative text (usually the
    /// most recent selected event) for similarity search.
    Extension { key: &'a str, sample: &'a str },
    /// An extension id or a free-text validation request.
    Text(&'a str),
}

impl SchemaQuery<'_> {
    fn key(&self) -> &str {
        match self {
            Self::Extension { key, .. } => key,
            Self::Text(text) => text,
        }
    }

    fn search_text(&self) -> &str {
        match self {
            Self::Extension { sample, .. } => sample,
            Self::Text(text) => text,
        }
    }
}

/// One row of the static extension map.
#[derive(Debug, Clone)]
pub struct ExactEntry {
    /// The configured key (friendly name or extension id).
    pub key: String,
    /// Which events belong to this extension.
    pub descriptor: MatchDescriptor,
    /// The schema, when the store holds one for this extension.
    pub schema: Option<Arc<Schema>>,
}

/// Static extension → (descriptor, schema) map.
#[derive(Debug, Clone, Default)]
pub struct ExactStrategy {
    entries: HashMap<String, ExactEntry>,
}

impl ExactStrategy {
    /// Pair every configured matcher with its schema from `store`.
    ///
    /// A matcher naming a schema uses that schema; otherwise the first schema
    /// with the same type and source is used. Matchers without a schema stay
    /// in the map so their extensions are still recognised.
    pub fn new<'a>(
        matchers: impl IntoIterator<Item = (&'a String, &'a ExtensionMatcher)>,
        store: &SchemaStore,
    ) -> Self {
        let entries = matchers
            .into_iter()
            .map(|(key, matcher)| {
                let schema = match &matcher.schema {
                    Some(name) => store.get(name).cloned(),
                    None => store
                        .find_by_type_source(&matcher.event_type, &matcher.source)
                        .cloned(),
                };
                if schema.is_none() {
                    warn!(extension = %key, "No schema in store for configured extension");
                }
                let entry = ExactEntry {
                    key: key.clone(),
                    descriptor: matcher.descriptor(),
                    schema,
                };
                (key.to_lowercase(), entry)
            })
            .collect();
        Self { entries }
    }

    /// Look up an extension by key (case-insensitive).
    pub fn get(&self, key: &str) -> Option<&ExactEntry> {
        self.entries.get(&key.to_lowercase())
    }

    /// The first of `keys` that has an entry.
    pub fn find<'k>(&self, keys: impl IntoIterator<Item = &'k str>) -> Option<&ExactEntry> {
        keys.into_iter().find_map(|k| self.get(k))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn resolve(&self, key: &str) -> Result<ResolvedSchema, ResolveError> {
        self.get(key)
            .and_then(|e| e.schema.clone())
            .map(|schema| ResolvedSchema {
                schema,
                resolution: Resolution::Exact,
            })
            .ok_or_else(|| ResolveError::NotFound(key.to_string()))
    }
}

/// Nearest-schema lookup over the vector index.
pub struct SemanticStrategy {
    index: Arc<SchemaIndex>,
    min_score: f32,
}

impl SemanticStrategy {
    pub fn new(index: Arc<SchemaIndex>, min_score: f32) -> Self {
        Self { index, min_score }
    }

    async fn resolve(&self, text: &str) -> Result<ResolvedSchema, ResolveError> {
        let mut hits = self.index.search(text, 1, self.min_score).await?;
        match hits.pop() {
            Some((schema, score)) => {
                debug!(schema = %schema.name, score, "Semantic schema match");
                Ok(ResolvedSchema {
                    schema,
                    resolution: Resolution::Semantic { score },
                })
            }
            None => Err(ResolveError::NotFound(text.to_string())),
        }
    }
}

/// Resolves schemas with the configured strategy.
pub struct SchemaResolver {
    strategy: ResolverStrategy,
    exact: ExactStrategy,
    semantic: Option<SemanticStrategy>,
}

impl SchemaResolver {
    /// Build a resolver. `index` is required for the semantic and hybrid
    /// strategies.
    pub fn new(
        config: &SchemaConfig,
        store: &SchemaStore,
        index: Option<Arc<SchemaIndex>>,
    ) -> Result<Self, ResolveError> {
        let exact = ExactStrategy::new(&config.extensions, store);
        let semantic = index.map(|i| SemanticStrategy::new(i, config.min_score));

        if config.strategy != ResolverStrategy::Exact && semantic.is_none() {
            return Err(ResolveError::NotConfigured(format!(
                "the {:?} strategy needs a schema index",
                config.strategy
            )));
        }

        Ok(Self {
            strategy: config.strategy,
            exact,
            semantic,
        })
    }

    /// Exact-only resolver over an explicit map.
    pub fn exact(exact: ExactStrategy) -> Self {
        Self {
            strategy: ResolverStrategy::Exact,
            exact,
            semantic: None,
        }
    }

    pub fn strategy(&self) -> ResolverStrategy {
        self.strategy
    }

    /// The static extension map, which decides which extensions are
    /// validated at all.
    pub fn extensions(&self) -> &ExactStrategy {
        &self.exact
    }

    /// Whether free-text similarity search is available.
    pub fn has_semantic(&self) -> bool {
        self.semantic.is_some()
    }

    pub async fn resolve(&self, query: SchemaQuery<'_>) -> Result<ResolvedSchema, ResolveError> {
        match self.strategy {
            ResolverStrategy::Exact => self.exact.resolve(query.key()),
            ResolverStrategy::Semantic => self.semantic()?.resolve(query.search_text()).await,
            ResolverStrategy::Hybrid => match self.exact.resolve(query.key()) {
                Ok(resolved) => Ok(resolved),
                Err(ResolveError::NotFound(_)) => {
                    self.semantic()?.resolve(query.search_text()).await
                }
                Err(e) => Err(e),
            },
        }
    }

    /// Semantic lookup regardless of the configured strategy. Used for
    /// free-text validation requests.
    pub async fn resolve_text(&self, text: &str) -> Result<ResolvedSchema, ResolveError> {
        match &self.semantic {
            Some(semantic) => semantic.resolve(text).await,
            None => self.exact.resolve(text),
        }
    }

    fn semantic(&self) -> Result<&SemanticStrategy, ResolveError> {
        self.semantic
            .as_ref()
            .ok_or_else(|| ResolveError::NotConfigured("no schema index".into()))
    }
}
