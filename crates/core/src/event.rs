//! Captured Assurance events and the read-only store they are served from.
//!
//! Events arrive from the inspection host as JSON objects in the Assurance
//! wire format (`ACPExtensionEventType`, `ACPExtensionEventSource`, ...).
//! The store is ordered **most recent first**; every selection routine in
//! the validator relies on that ordering and never re-sorts.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// A single captured diagnostic event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier, reported back by validation results.
    #[serde(default)]
    pub uuid: String,

    /// Capture time in milliseconds since the epoch.
    #[serde(default)]
    pub timestamp: i64,

    /// Coarse classifier (e.g. "generic").
    #[serde(rename = "type", default)]
    pub kind: String,

    /// The SDK event body. Absent on some host-generated events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<EventPayload>,
}

/// The SDK-level body of an event.
///
/// Every field is optional on the wire; an event whose payload lacks the
/// type or the source is *invalid* and never matches anything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    #[serde(
        rename = "ACPExtensionEventType",
        alias = "extensionEventType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub event_type: Option<String>,

    #[serde(
        rename = "ACPExtensionEventSource",
        alias = "extensionEventSource",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub event_source: Option<String>,

    #[serde(
        rename = "ACPExtensionEventName",
        alias = "extensionEventName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub event_name: Option<String>,

    #[serde(
        rename = "ACPExtensionEventData",
        alias = "extensionEventData",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,

    /// Any other payload keys the SDK emitted, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventPayload {
    /// True when both the event type and the event source are present.
    pub fn is_valid(&self) -> bool {
        self.event_type.is_some() && self.event_source.is_some()
    }
}

impl Event {
    /// True when the event carries a payload with a type and a source.
    pub fn is_valid(&self) -> bool {
        self.payload.as_ref().is_some_and(EventPayload::is_valid)
    }

    pub fn event_type(&self) -> Option<&str> {
        self.payload.as_ref()?.event_type.as_deref()
    }

    pub fn event_source(&self) -> Option<&str> {
        self.payload.as_ref()?.event_source.as_deref()
    }

    pub fn event_name(&self) -> Option<&str> {
        self.payload.as_ref()?.event_name.as_deref()
    }

    pub fn data(&self) -> Option<&Value> {
        self.payload.as_ref()?.data.as_ref()
    }

    pub fn metadata(&self) -> Option<&Value> {
        self.payload.as_ref()?.metadata.as_ref()
    }
}

/// An immutable, cheaply clonable snapshot of captured events.
///
/// Ordering is reverse-chronological. A validation run holds one snapshot
/// for its whole duration; pushing new events creates a new snapshot rather
/// than mutating this one.
#[derive(Debug, Clone)]
pub struct EventStore {
    events: Arc<[Event]>,
}

impl EventStore {
    /// Wrap events that are already ordered most recent first.
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events: events.into(),
        }
    }

    /// Wrap events captured oldest first, reversing them into store order.
    pub fn from_chronological(mut events: Vec<Event>) -> Self {
        events.reverse();
        Self::new(events)
    }

    /// Build a store from raw JSON values, dropping entries that are not
    /// event objects. Order is preserved.
    pub fn from_values(values: Vec<Value>) -> Self {
        let total = values.len();
        let events: Vec<Event> = values
            .into_iter()
            .filter_map(|v| match serde_json::from_value::<Event>(v) {
                Ok(event) => Some(event),
                Err(e) => {
                    debug!("Skipping malformed event: {e}");
                    None
                }
            })
            .collect();
        if events.len() < total {
            debug!(
                kept = events.len(),
                dropped = total - events.len(),
                "Malformed events dropped from capture"
            );
        }
        Self::new(events)
    }

    /// Parse a JSON array of events (most recent first).
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let values: Vec<Value> = serde_json::from_str(json)?;
        Ok(Self::from_values(values))
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The most recent event, if any.
    pub fn latest(&self) -> Option<&Event> {
        self.events.first()
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl From<Vec<Event>> for EventStore {
    fn from(events: Vec<Event>) -> Self {
        Self::new(events)
    }
}

impl<'a> IntoIterator for &'a EventStore {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn analytics_event() -> Value {
        json!({
            "uuid": "e-1",
            "timestamp": 1_690_000_000_000_i64,
            "type": "generic",
            "payload": {
                "ACPExtensionEventType": "com.adobe.eventtype.analytics",
                "ACPExtensionEventSource": "com.adobe.eventsource.responsecontent",
                "ACPExtensionEventName": "AnalyticsResponse",
                "ACPExtensionEventData": { "analyticsserverresponse": "" },
                "ACPExtensionEventNumber": 42
            }
        })
    }

    #[test]
    fn parses_assurance_wire_format() {
        let event: Event = serde_json::from_value(analytics_event()).unwrap();
        assert_eq!(event.uuid, "e-1");
        assert_eq!(event.kind, "generic");
        assert_eq!(event.event_type(), Some("com.adobe.eventtype.analytics"));
        assert_eq!(event.event_name(), Some("AnalyticsResponse"));
        assert!(event.is_valid());

        let payload = event.payload.as_ref().unwrap();
        assert_eq!(payload.extra.get("ACPExtensionEventNumber"), Some(&json!(42)));
    }

    #[test]
    fn accepts_plain_field_spellings() {
        let event: Event = serde_json::from_value(json!({
            "uuid": "e-2",
            "type": "generic",
            "payload": {
                "extensionEventType": "com.adobe.eventtype.edge",
                "extensionEventSource": "com.adobe.eventsource.requestcontent"
            }
        }))
        .unwrap();
        assert_eq!(event.event_source(), Some("com.adobe.eventsource.requestcontent"));
        assert!(event.is_valid());
    }

    #[test]
    fn missing_source_is_invalid() {
        let event: Event = serde_json::from_value(json!({
            "uuid": "e-3",
            "type": "generic",
            "payload": { "ACPExtensionEventType": "com.adobe.eventtype.edge" }
        }))
        .unwrap();
        assert!(!event.is_valid());

        let no_payload: Event = serde_json::from_value(json!({"uuid": "e-4"})).unwrap();
        assert!(!no_payload.is_valid());
        assert_eq!(no_payload.event_type(), None);
    }

    #[test]
    fn store_drops_malformed_entries_and_keeps_order() {
        let store = EventStore::from_values(vec![
            analytics_event(),
            json!("not an event"),
            json!({"uuid": "e-9", "type": "generic"}),
        ]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.events()[0].uuid, "e-1");
        assert_eq!(store.events()[1].uuid, "e-9");
    }

    #[test]
    fn chronological_capture_is_reversed() {
        let events: Vec<Event> = (0..3)
            .map(|i| Event {
                uuid: format!("e-{i}"),
                timestamp: i,
                kind: "generic".into(),
                payload: None,
            })
            .collect();
        let store = EventStore::from_chronological(events);
        assert_eq!(store.latest().unwrap().uuid, "e-2");
    }

    #[test]
    fn clones_share_the_snapshot() {
        let store = EventStore::from_json(&format!("[{}]", analytics_event())).unwrap();
        let clone = store.clone();
        assert!(std::ptr::eq(store.events(), clone.events()));
    }
}
