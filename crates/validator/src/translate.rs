//! Natural-language renderings of events and schemas.
//!
//! Sentence form is denser than raw JSON for a model, and it is what the
//! semantic schema lookup embeds as a representative of an extension's
//! events.

use assurance_core::{Event, Schema};
use serde_json::{Map, Value};

/// One sentence describing `event`, with data and metadata flattened to
/// dot-separated keys.
pub fn event_text(event: &Event) -> String {
    let mut text = match event.event_name() {
        Some(name) => format!("Event {name} with uuid {}", event.uuid),
        None => format!("Event with uuid {}", event.uuid),
    };
    text.push_str(&format!(
        " of type {} and source {} at timestamp {}",
        event.event_type().unwrap_or_default(),
        event.event_source().unwrap_or_default(),
        event.timestamp
    ));

    if let Some(data) = event.data() {
        text.push_str(" with data ");
        text.push_str(&flatten(data).to_string());
    }
    if let Some(metadata) = event.metadata() {
        text.push_str(" with metadata ");
        text.push_str(&flatten(metadata).to_string());
    }
    text
}

/// The schema as a rule list.
pub fn schema_text(schema: &Schema) -> String {
    let mut text = format!(
        "Schema set of rules to validate the event. Event must have ACPExtensionEventType = {} and ACPExtensionEventSource = {}",
        schema.event_type, schema.event_source
    );
    if let Some(name) = &schema.event_name {
        text.push_str(&format!(" and ACPExtensionEventName = {name}"));
    }
    text.push_str(". ");

    if !schema.required.is_empty() {
        text.push_str("Event must have these properties.");
        for prop in &schema.required {
            text.push_str(&format!(" {prop},"));
        }
        text.push(' ');
    }
    if !schema.payload_required.is_empty() {
        text.push_str("Event data must have these required fields.");
        for field in &schema.payload_required {
            text.push_str(&format!(" {field},"));
        }
    }
    text.trim_end().to_string()
}

/// Flatten nested objects and arrays into a single object keyed by
/// dot-joined paths (`{"a":{"b":[1]}}` becomes `{"a.b.0":1}`).
///
/// Empty containers are kept as leaf values. Scalars are returned as is.
pub fn flatten(value: &Value) -> Value {
    match value {
        Value::Object(_) | Value::Array(_) => {
            let mut out = Map::new();
            flatten_into(value, None, &mut out);
            Value::Object(out)
        }
        scalar => scalar.clone(),
    }
}

fn flatten_into(value: &Value, prefix: Option<&str>, out: &mut Map<String, Value>) {
    let key = |k: &str| match prefix {
        Some(p) => format!("{p}.{k}"),
        None => k.to_string(),
    };

    match value {
        Value::Object(obj) if !obj.is_empty() => {
            for (k, v) in obj {
                flatten_into(v, Some(&key(k)), out);
            }
        }
        Value::Array(arr) if !arr.is_empty() => {
            for (i, v) in arr.iter().enumerate() {
                flatten_into(v, Some(&key(&i.to_string())), out);
            }
        }
        leaf => {
            if let Some(p) = prefix {
                out.insert(p.to_string(), leaf.clone());
            }
        }
    }
}
