//! In-memory vector index over schema documents.
//!
//! Each schema is embedded once when it is added. Searches embed the query
//! text and rank schemas by cosine similarity. The index is the only
//! long-lived shared resource in the validator: searches take the shared
//! lock, additions take the exclusive lock, so an addition never races a
//! search in progress.

use crate::store::SchemaStore;
use crate::vector;
use assurance_core::{EmbeddingProvider, ProviderError, Schema};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

struct IndexedSchema {
    schema: Arc<Schema>,
    embedding: Vec<f32>,
}

/// A similarity-searchable set of schemas.
pub struct SchemaIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    entries: RwLock<Vec<IndexedSchema>>,
}

impl SchemaIndex {
    /// Create an empty index.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Create an index holding every schema in `store`.
    pub async fn build(
        store: &SchemaStore,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self, ProviderError> {
        let index = Self::new(embedder);
        index.add(store.iter().cloned()).await?;
        Ok(index)
    }

    /// Embed and add schemas. A schema with a name already in the index
    /// replaces the old entry. Returns the number of schemas added.
    pub async fn add(
        &self,
        schemas: impl IntoIterator<Item = Arc<Schema>>,
    ) -> Result<usize, ProviderError> {
        let schemas: Vec<Arc<Schema>> = schemas.into_iter().collect();
        if schemas.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = schemas.iter().map(|s| document_text(s)).collect();
        let embeddings = self.embedder.embed(&texts).await?;
        if embeddings.len() != schemas.len() {
            return Err(ProviderError::Embedding(format!(
                "expected {} embeddings from '{}', got {}",
                schemas.len(),
                self.embedder.name(),
                embeddings.len()
            )));
        }

        let added = schemas.len();
        let mut entries = self.entries.write().await;
        for (schema, embedding) in schemas.into_iter().zip(embeddings) {
            match entries.iter_mut().find(|e| e.schema.name == schema.name) {
                Some(existing) => {
                    existing.schema = schema;
                    existing.embedding = embedding;
                }
                None => entries.push(IndexedSchema { schema, embedding }),
            }
        }
        debug!(added, total = entries.len(), "Schema index updated");
        Ok(added)
    }

    /// The `k` schemas most similar to `query`, best first.
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        min_score: f32,
    ) -> Result<Vec<(Arc<Schema>, f32)>, ProviderError> {
        let mut vectors = self.embedder.embed(&[query.to_string()]).await?;
        let query_embedding = vectors.pop().ok_or_else(|| {
            ProviderError::Embedding(format!(
                "'{}' returned no embedding for the query",
                self.embedder.name()
            ))
        })?;

        let entries = self.entries.read().await;
        let ranked = vector::top_k(
            entries.iter().map(|e| e.embedding.as_slice()),
            &query_embedding,
            k,
            min_score,
        );
        Ok(ranked
            .into_iter()
            .map(|(i, score)| (Arc::clone(&entries[i].schema), score))
            .collect())
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// The text a schema is embedded as: its description, the event it pins,
/// and the full document.
pub fn document_text(schema: &Schema) -> String {
    format!(
        "{}\nACPExtensionEventType: {}\nACPExtensionEventSource: {}\n{}",
        schema.label(),
        schema.event_type,
        schema.event_source,
        schema.canonical_text()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{KeywordEmbedder, schema};

    fn store() -> SchemaStore {
        SchemaStore::from_schemas(vec![
            schema("analytics", "com.adobe.eventtype.analytics", "com.adobe.eventsource.responsecontent", "analytics response"),
            schema("edge", "com.adobe.eventtype.edge", "com.adobe.eventsource.requestcontent", "edge request"),
            schema("lifecycle", "com.adobe.eventtype.lifecycle", "com.adobe.eventsource.responsecontent", "lifecycle start"),
        ])
    }

    #[tokio::test]
    async fn builds_from_store() {
        let index = SchemaIndex::build(&store(), Arc::new(KeywordEmbedder::default()))
            .await
            .unwrap();
        assert_eq!(index.len().await, 3);
    }

    #[tokio::test]
    async fn search_returns_best_match_first() {
        let index = SchemaIndex::build(&store(), Arc::new(KeywordEmbedder::default()))
            .await
            .unwrap();
        let results = index.search("validate the edge request", 2, 0.0).await.unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].0.name, "edge");
        assert!(results.len() <= 2);
    }

    #[tokio::test]
    async fn adding_same_name_replaces() {
        let index = SchemaIndex::build(&store(), Arc::new(KeywordEmbedder::default()))
            .await
            .unwrap();
        let replacement = schema("edge", "com.adobe.eventtype.edge", "com.adobe.eventsource.responsecontent", "edge response");
        index.add([Arc::new(replacement)]).await.unwrap();
        assert_eq!(index.len().await, 3);

        let results = index.search("edge", 1, 0.0).await.unwrap();
        assert_eq!(results[0].0.event_source, "com.adobe.eventsource.responsecontent");
    }

    #[tokio::test]
    async fn embedding_failure_propagates() {
        let index = SchemaIndex::new(Arc::new(KeywordEmbedder::failing()));
        let err = index.search("anything", 1, 0.0).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
    }

    #[tokio::test]
    async fn concurrent_searches_during_add() {
        let index = Arc::new(
            SchemaIndex::build(&store(), Arc::new(KeywordEmbedder::default()))
                .await
                .unwrap(),
        );

        let mut handles = Vec::new();
        for _ in 0..8 {
            let index = Arc::clone(&index);
            handles.push(tokio::spawn(async move {
                index.search("analytics", 1, 0.0).await.unwrap().len()
            }));
        }
        index
            .add([Arc::new(schema("places", "com.adobe.eventtype.places", "com.adobe.eventsource.requestcontent", "places"))])
            .await
            .unwrap();

        for h in handles {
            assert_eq!(h.await.unwrap(), 1);
        }
        assert_eq!(index.len().await, 4);
    }
}
