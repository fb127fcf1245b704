//! Match descriptors — declarative rules for "relevant events".

use serde::{Deserialize, Serialize};

/// Number of events selected when a descriptor does not say otherwise.
pub const DEFAULT_EVENT_COUNT: usize = 10;

/// Describes which events are relevant to an extension or schema.
///
/// Comparisons against events are case-insensitive. An absent or empty
/// `name` matches any event name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchDescriptor {
    /// Expected `ACPExtensionEventType`.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Expected `ACPExtensionEventSource`.
    pub source: String,

    /// Expected `ACPExtensionEventName`, if the name matters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Maximum number of events to select. Non-positive means default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
}

impl MatchDescriptor {
    pub fn new(event_type: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            source: source.into(),
            name: None,
            count: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_count(mut self, count: i64) -> Self {
        self.count = Some(count);
        self
    }

    /// The effective selection limit.
    pub fn limit(&self) -> usize {
        match self.count {
            Some(n) if n > 0 => usize::try_from(n).unwrap_or(usize::MAX),
            _ => DEFAULT_EVENT_COUNT,
        }
    }

    /// The name filter, or `None` when the name is a wildcard.
    pub fn name_filter(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    /// A copy with every string field lowercased.
    pub fn to_lowercase(&self) -> Self {
        Self {
            event_type: self.event_type.to_lowercase(),
            source: self.source.to_lowercase(),
            name: self.name.as_ref().map(|n| n.to_lowercase()),
            count: self.count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_defaults_when_absent_or_non_positive() {
        let d = MatchDescriptor::new("t", "s");
        assert_eq!(d.limit(), DEFAULT_EVENT_COUNT);
        assert_eq!(d.clone().with_count(0).limit(), DEFAULT_EVENT_COUNT);
        assert_eq!(d.clone().with_count(-3).limit(), DEFAULT_EVENT_COUNT);
        assert_eq!(d.with_count(2).limit(), 2);
    }

    #[test]
    fn empty_name_is_wildcard() {
        assert_eq!(MatchDescriptor::new("t", "s").with_name("").name_filter(), None);
        assert_eq!(
            MatchDescriptor::new("t", "s").with_name("Ping").name_filter(),
            Some("Ping")
        );
    }

    #[test]
    fn deserializes_from_config_shape() {
        let d: MatchDescriptor = serde_json::from_str(
            r#"{"type": "com.adobe.eventtype.edge", "source": "com.adobe.eventsource.requestcontent", "count": 2}"#,
        )
        .unwrap();
        assert_eq!(d.event_type, "com.adobe.eventtype.edge");
        assert_eq!(d.limit(), 2);
        assert!(d.name.is_none());
    }
}
