//! Validation schemas — JSON-Schema-like documents describing one SDK event.
//!
//! A schema pins the event type and source through `const` values under
//! `properties.payload.properties` and lists the required top-level fields.
//! Schemas are reference data: loaded once, never mutated.

use crate::descriptor::MatchDescriptor;
use crate::error::SchemaError;
use serde_json::Value;

const TYPE_KEYS: [&str; 2] = ["ACPExtensionEventType", "extensionEventType"];
const SOURCE_KEYS: [&str; 2] = ["ACPExtensionEventSource", "extensionEventSource"];
const NAME_KEYS: [&str; 2] = ["ACPExtensionEventName", "extensionEventName"];

/// A parsed, validated schema document.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    /// Store key (usually the file stem).
    pub name: String,
    /// One-line description, used for semantic search and labels.
    pub short_desc: Option<String>,
    /// The `const` event type the schema applies to.
    pub event_type: String,
    /// The `const` event source the schema applies to.
    pub event_source: String,
    /// The `const` event name, when the schema pins one.
    pub event_name: Option<String>,
    /// Required top-level event properties.
    pub required: Vec<String>,
    /// Required payload fields.
    pub payload_required: Vec<String>,
    document: Value,
}

impl Schema {
    /// Validate a schema document.
    pub fn from_value(name: impl Into<String>, document: Value) -> Result<Self, SchemaError> {
        let name = name.into();

        let payload = payload_node(&document);
        let event_type = payload_const(payload, &TYPE_KEYS).ok_or_else(|| {
            SchemaError::MissingField {
                name: name.clone(),
                field: "properties.payload.properties.ACPExtensionEventType.const".into(),
            }
        })?;
        let event_source = payload_const(payload, &SOURCE_KEYS).ok_or_else(|| {
            SchemaError::MissingField {
                name: name.clone(),
                field: "properties.payload.properties.ACPExtensionEventSource.const".into(),
            }
        })?;
        let event_name = payload_const(payload, &NAME_KEYS);

        let required = string_array(document.get("required")).ok_or_else(|| {
            SchemaError::MissingField {
                name: name.clone(),
                field: "required".into(),
            }
        })?;
        let payload_required =
            string_array(payload.and_then(|p| p.get("required"))).unwrap_or_default();

        let short_desc = document
            .get("shortDesc")
            .or_else(|| document.get("description"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            name,
            short_desc,
            event_type,
            event_source,
            event_name,
            required,
            payload_required,
            document,
        })
    }

    /// Parse and validate a schema from JSON text.
    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self, SchemaError> {
        let name = name.into();
        let document = serde_json::from_str(json).map_err(|e| SchemaError::Parse {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        Self::from_value(name, document)
    }

    /// The raw document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Canonical text form: the document as pretty-printed JSON.
    pub fn canonical_text(&self) -> String {
        serde_json::to_string_pretty(&self.document).unwrap_or_default()
    }

    /// The descriptor of events this schema applies to.
    pub fn descriptor(&self) -> MatchDescriptor {
        MatchDescriptor {
            event_type: self.event_type.clone(),
            source: self.event_source.clone(),
            name: self.event_name.clone(),
            count: None,
        }
    }

    /// Short description if present, otherwise the store key.
    pub fn label(&self) -> &str {
        self.short_desc.as_deref().unwrap_or(&self.name)
    }
}

/// `properties.payload`, tolerating documents that put `payload` at the root.
fn payload_node(document: &Value) -> Option<&Value> {
    document
        .pointer("/properties/payload")
        .or_else(|| document.get("payload"))
}

fn payload_const(payload: Option<&Value>, keys: &[&str]) -> Option<String> {
    let props = payload?.get("properties")?;
    keys.iter()
        .find_map(|k| props.get(*k)?.get("const")?.as_str())
        .map(str::to_string)
}

fn string_array(value: Option<&Value>) -> Option<Vec<String>> {
    let arr = value?.as_array()?;
    Some(
        arr.iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn analytics_schema() -> Value {
        json!({
            "title": "Analytics response",
            "shortDesc": "Analytics response content event",
            "type": "object",
            "required": ["uuid", "timestamp", "payload"],
            "properties": {
                "payload": {
                    "type": "object",
                    "required": ["ACPExtensionEventData"],
                    "properties": {
                        "ACPExtensionEventType": { "const": "com.adobe.eventtype.analytics" },
                        "ACPExtensionEventSource": { "const": "com.adobe.eventsource.responsecontent" }
                    }
                }
            }
        })
    }

    #[test]
    fn parses_required_fields() {
        let schema = Schema::from_value("analytics", analytics_schema()).unwrap();
        assert_eq!(schema.event_type, "com.adobe.eventtype.analytics");
        assert_eq!(schema.event_source, "com.adobe.eventsource.responsecontent");
        assert_eq!(schema.required, vec!["uuid", "timestamp", "payload"]);
        assert_eq!(schema.payload_required, vec!["ACPExtensionEventData"]);
        assert_eq!(schema.label(), "Analytics response content event");
        assert!(schema.event_name.is_none());
    }

    #[test]
    fn missing_type_const_is_rejected() {
        let mut doc = analytics_schema();
        doc["properties"]["payload"]["properties"]
            .as_object_mut()
            .unwrap()
            .remove("ACPExtensionEventType");
        let err = Schema::from_value("broken", doc).unwrap_err();
        assert!(matches!(err, SchemaError::MissingField { ref field, .. } if field.contains("EventType")));
    }

    #[test]
    fn missing_required_array_is_rejected() {
        let mut doc = analytics_schema();
        doc.as_object_mut().unwrap().remove("required");
        let err = Schema::from_value("broken", doc).unwrap_err();
        assert!(matches!(err, SchemaError::MissingField { ref field, .. } if field == "required"));
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = Schema::from_json("bad", "{ nope").unwrap_err();
        assert!(matches!(err, SchemaError::Parse { .. }));
    }

    #[test]
    fn descriptor_mirrors_consts() {
        let schema = Schema::from_value("analytics", analytics_schema()).unwrap();
        let d = schema.descriptor();
        assert_eq!(d.event_type, schema.event_type);
        assert_eq!(d.source, schema.event_source);
        assert_eq!(d.count, None);
    }

    #[test]
    fn canonical_text_is_stable() {
        let schema = Schema::from_value("analytics", analytics_schema()).unwrap();
        assert_eq!(schema.canonical_text(), schema.canonical_text());
        assert!(schema.canonical_text().contains("com.adobe.eventtype.analytics"));
    }
}
