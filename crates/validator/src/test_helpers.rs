//! Shared test helpers for validator tests.

use assurance_core::{
    Completion, CompletionProvider, CompletionRequest, Event, EventPayload, ProviderError, Schema,
    TokenCounter, Usage,
};
use serde_json::{Value, json};
use std::sync::Mutex;

pub const EDGE_TYPE: &str = "com.adobe.eventtype.edge";
pub const EDGE_SOURCE: &str = "com.adobe.eventsource.requestcontent";
pub const ANALYTICS_TYPE: &str = "com.adobe.eventtype.analytics";
pub const ANALYTICS_SOURCE: &str = "com.adobe.eventsource.responsecontent";

/// Counts whitespace-separated words. Predictable costs for budget tests.
pub struct WordCounter;

impl TokenCounter for WordCounter {
    fn name(&self) -> &str {
        "words"
    }

    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

/// A mock provider that returns a sequence of scripted responses and
/// records every request it receives.
///
/// Panics if more calls are made than responses provided.
pub struct ScriptedProvider {
    responses: Mutex<Vec<Result<String, ProviderError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            panic!("ScriptedProvider: no more responses (call #{})", requests.len() + 1);
        }
        let model = request.model.clone();
        requests.push(request);
        responses.remove(0).map(|text| Completion {
            text,
            model,
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
        })
    }
}

fn sdk_event(uuid: &str, event_type: &str, source: &str, data: Value) -> Event {
    Event {
        uuid: uuid.into(),
        timestamp: 1_690_000_000_000,
        kind: "generic".into(),
        payload: Some(EventPayload {
            event_type: Some(event_type.into()),
            event_source: Some(source.into()),
            event_name: Some("Test Event".into()),
            data: Some(data),
            ..Default::default()
        }),
    }
}

pub fn edge_event(uuid: &str) -> Event {
    sdk_event(uuid, EDGE_TYPE, EDGE_SOURCE, json!({ "xdm": { "eventType": "web.webpagedetails.pageViews" } }))
}

pub fn analytics_event(uuid: &str) -> Event {
    sdk_event(uuid, ANALYTICS_TYPE, ANALYTICS_SOURCE, json!({ "analyticsserverresponse": "ok" }))
}

/// A hub shared-state event announcing `extensions` as `(id, friendly name)`.
pub fn hub_event(uuid: &str, extensions: &[(&str, &str)]) -> Event {
    let extensions: serde_json::Map<String, Value> = extensions
        .iter()
        .map(|(id, name)| (id.to_string(), json!({ "friendlyName": name, "version": "1.0.0" })))
        .collect();
    Event {
        uuid: uuid.into(),
        timestamp: 1_690_000_000_000,
        kind: "generic".into(),
        payload: Some(EventPayload {
            event_type: Some(crate::registry::HUB_EVENT_TYPE.into()),
            event_source: Some(crate::registry::SHARED_STATE_SOURCE.into()),
            event_name: Some("Shared state change".into()),
            data: Some(json!({ "stateowner": crate::registry::HUB_STATE_OWNER })),
            metadata: Some(json!({ "state.data": { "extensions": extensions } })),
            ..Default::default()
        }),
    }
}

fn schema(name: &str, event_type: &str, source: &str) -> Schema {
    Schema::from_value(
        name,
        json!({
            "shortDesc": format!("{name} events"),
            "required": ["uuid", "payload"],
            "properties": { "payload": {
                "required": ["ACPExtensionEventData"],
                "properties": {
                    "ACPExtensionEventType": { "const": event_type },
                    "ACPExtensionEventSource": { "const": source }
                }
            }}
        }),
    )
    .unwrap()
}

pub fn edge_schema() -> Schema {
    schema("edge", EDGE_TYPE, EDGE_SOURCE)
}

pub fn analytics_schema() -> Schema {
    schema("analytics", ANALYTICS_TYPE, ANALYTICS_SOURCE)
}
