//! The static collection of validation schemas.
//!
//! Schemas are loaded once at startup, either from a directory of `*.json`
//! files (the file stem becomes the schema name) or from a single JSON file
//! holding one document or an array of documents. Every document is
//! validated on load; a bad document fails the whole load, since a partial
//! store silently skips extensions.

use assurance_core::{Schema, SchemaError};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Read-only, shareable set of schemas.
#[derive(Debug, Clone, Default)]
pub struct SchemaStore {
    schemas: Vec<Arc<Schema>>,
    by_name: HashMap<String, usize>,
}

impl SchemaStore {
    /// Build a store from already-validated schemas. Later duplicates of a
    /// name replace earlier ones.
    pub fn from_schemas(schemas: impl IntoIterator<Item = Schema>) -> Self {
        let mut store = Self::default();
        for schema in schemas {
            match store.by_name.get(&schema.name) {
                Some(&idx) => store.schemas[idx] = Arc::new(schema),
                None => {
                    store.by_name.insert(schema.name.clone(), store.schemas.len());
                    store.schemas.push(Arc::new(schema));
                }
            }
        }
        store
    }

    /// Load from a directory or a single JSON file.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let store = if path.is_dir() {
            Self::load_dir(path)?
        } else {
            Self::load_file(path)?
        };
        if store.is_empty() {
            return Err(SchemaError::Empty);
        }
        info!(path = %path.display(), count = store.len(), "Schema store loaded");
        Ok(store)
    }

    /// Load every `*.json` file in `dir`, in file-name order.
    pub fn load_dir(dir: &Path) -> Result<Self, SchemaError> {
        let entries = std::fs::read_dir(dir).map_err(|e| io_error(dir, e))?;

        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")))
            .collect();
        paths.sort();

        let mut schemas = Vec::with_capacity(paths.len());
        for path in &paths {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let content = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
            debug!(schema = %name, "Loading schema");
            schemas.push(Schema::from_json(name, &content)?);
        }

        Ok(Self::from_schemas(schemas))
    }

    /// Load a single file holding one schema or an array of schemas.
    ///
    /// Array entries are named by their `title` or `$id`, falling back to
    /// `<file stem>-<index>`.
    pub fn load_file(path: &Path) -> Result<Self, SchemaError> {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
        let value: Value = serde_json::from_str(&content).map_err(|e| SchemaError::Parse {
            name: stem.clone(),
            reason: e.to_string(),
        })?;

        let schemas = match value {
            Value::Array(docs) => docs
                .into_iter()
                .enumerate()
                .map(|(i, doc)| {
                    let name = doc
                        .get("title")
                        .or_else(|| doc.get("$id"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("{stem}-{i}"));
                    Schema::from_value(name, doc)
                })
                .collect::<Result<Vec<_>, _>>()?,
            doc => vec![Schema::from_value(stem, doc)?],
        };

        Ok(Self::from_schemas(schemas))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Schema>> {
        self.by_name.get(name).map(|&idx| &self.schemas[idx])
    }

    /// First schema whose type and source consts match (case-insensitive).
    pub fn find_by_type_source(&self, event_type: &str, source: &str) -> Option<&Arc<Schema>> {
        self.schemas.iter().find(|s| {
            s.event_type.eq_ignore_ascii_case(event_type)
                && s.event_source.eq_ignore_ascii_case(source)
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Schema>> {
        self.schemas.iter()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

fn io_error(path: &Path, e: std::io::Error) -> SchemaError {
    SchemaError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema_doc(event_type: &str, source: &str, desc: &str) -> Value {
        json!({
            "shortDesc": desc,
            "required": ["uuid", "payload"],
            "properties": { "payload": { "properties": {
                "ACPExtensionEventType": { "const": event_type },
                "ACPExtensionEventSource": { "const": source }
            }}}
        })
    }

    #[test]
    fn loads_directory_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("edge.json"),
            schema_doc("com.adobe.eventtype.edge", "com.adobe.eventsource.requestcontent", "Edge request")
                .to_string(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("analytics.json"),
            schema_doc("com.adobe.eventtype.analytics", "com.adobe.eventsource.responsecontent", "Analytics response")
                .to_string(),
        )
        .unwrap();
        std::fs::write(dir.path().join("README.md"), "not a schema").unwrap();

        let store = SchemaStore::load(dir.path()).unwrap();
        let names: Vec<_> = store.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["analytics", "edge"]);
        assert!(store.get("edge").is_some());
    }

    #[test]
    fn loads_array_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("validation.schemas.json");
        let mut first = schema_doc("a.type", "a.source", "first");
        first["title"] = json!("First");
        let second = schema_doc("b.type", "b.source", "second");
        std::fs::write(&path, json!([first, second]).to_string()).unwrap();

        let store = SchemaStore::load(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.get("First").is_some());
        assert!(store.get("validation.schemas-1").is_some());
    }

    #[test]
    fn invalid_document_fails_the_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), r#"{"required": []}"#).unwrap();
        let err = SchemaStore::load(dir.path()).unwrap_err();
        assert!(matches!(err, SchemaError::MissingField { ref name, .. } if name == "broken"));
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(SchemaStore::load(dir.path()), Err(SchemaError::Empty)));
    }

    #[test]
    fn missing_path_is_an_io_error() {
        let err = SchemaStore::load(Path::new("/nonexistent/schemas.json")).unwrap_err();
        assert!(matches!(err, SchemaError::Io { .. }));
    }

    #[test]
    fn find_by_type_source_ignores_case() {
        let store = SchemaStore::from_schemas(vec![
            Schema::from_value("edge", schema_doc("com.adobe.eventtype.edge", "com.adobe.eventsource.requestcontent", "x"))
                .unwrap(),
        ]);
        assert!(store
            .find_by_type_source("COM.ADOBE.EVENTTYPE.EDGE", "com.adobe.eventsource.RequestContent")
            .is_some());
        assert!(store.find_by_type_source("com.adobe.eventtype.edge", "other").is_none());
    }

    #[test]
    fn duplicate_names_replace() {
        let store = SchemaStore::from_schemas(vec![
            Schema::from_value("x", schema_doc("t1", "s1", "old")).unwrap(),
            Schema::from_value("x", schema_doc("t2", "s2", "new")).unwrap(),
        ]);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("x").unwrap().event_type, "t2");
    }
}
